mod helpers;

use axum::http::StatusCode;
use tower::ServiceExt;

use api::auth::generate_jwt;
use db::factories;
use db::models::{branch, department, semester};

use helpers::app::{bare_request, body_json, json_request, make_test_app};

#[tokio::test]
async fn test_department_crud_and_delete_guard() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let admin = factories::admin(db).await;
    let (token, _) = generate_jwt(admin.id, admin.role);

    // create
    let body = serde_json::json!({ "name": "Computer Science", "code": "cse" });
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/departments", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    let dept_id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["code"], "CSE"); // codes are uppercased

    // duplicate code
    let body = serde_json::json!({ "name": "Other", "code": "CSE" });
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/departments", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // a branch blocks deletion
    branch::Model::create(db, "Software Eng", "SE", dept_id)
        .await
        .unwrap();
    let resp = app
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/api/departments/{dept_id}"),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // listing is ordered and wrapped in the envelope
    let resp = app
        .oneshot(bare_request("GET", "/api/departments", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_branch_code_unique_per_department_only() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let admin = factories::admin(db).await;
    let (token, _) = generate_jwt(admin.id, admin.role);

    let d1 = department::Model::create(db, "Engineering", "ENG").await.unwrap();
    let d2 = department::Model::create(db, "Science", "SCI").await.unwrap();

    let body = serde_json::json!({ "name": "Mechanical", "code": "ME", "department_id": d1.id });
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/branches", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // same code in the same department conflicts
    let body = serde_json::json!({ "name": "Mech 2", "code": "ME", "department_id": d1.id });
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/branches", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // but is fine in another department
    let body = serde_json::json!({ "name": "Mech Sci", "code": "ME", "department_id": d2.id });
    let resp = app
        .oneshot(json_request("POST", "/api/branches", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_class_creation_and_teacher_assignment() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let admin = factories::admin(db).await;
    let teacher = factories::teacher(db).await;
    let (token, _) = generate_jwt(admin.id, admin.role);

    let dept = department::Model::create(db, "Engineering", "ENG").await.unwrap();
    let br = branch::Model::create(db, "Computer", "CSE", dept.id).await.unwrap();
    let sem = semester::Model::create(db, 5).await.unwrap();

    let body = serde_json::json!({
        "name": "5CSE1", "division": "1",
        "semester_id": sem.id, "branch_id": br.id,
    });
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/classes", &token, body.clone()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let class_id = body_json(resp).await["data"]["id"].as_i64().unwrap();

    // duplicate name
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/classes", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // assign teacher, then again -> conflict
    let body = serde_json::json!({ "teacher_id": teacher.id });
    let uri = format!("/api/classes/{class_id}/teachers");
    let resp = app
        .clone()
        .oneshot(json_request("POST", &uri, &token, body.clone()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(json_request("POST", &uri, &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // the teacher now sees the class on their dashboard
    let (teacher_token, _) = generate_jwt(teacher.id, teacher.role);
    let resp = app
        .oneshot(bare_request("GET", "/api/classes/mine", &teacher_token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"][0]["name"], "5CSE1");
}

#[tokio::test]
async fn test_class_routes_require_admin() {
    let (app, app_state) = make_test_app().await;
    let teacher = factories::teacher(app_state.db()).await;
    let (token, _) = generate_jwt(teacher.id, teacher.role);

    let resp = app
        .oneshot(bare_request("GET", "/api/classes", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
