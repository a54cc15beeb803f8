mod helpers;

use axum::{body::Body, http::Request, http::StatusCode};
use tower::ServiceExt;

use api::auth::generate_jwt;
use db::factories;
use db::models::user::{self, Role, Status};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use helpers::app::{bare_request, body_json, json_request, make_test_app, with_connect_info};

#[tokio::test]
async fn test_create_staff_and_duplicate_email() {
    let (app, app_state) = make_test_app().await;
    let admin = factories::admin(app_state.db()).await;
    let (token, _) = generate_jwt(admin.id, admin.role);

    let body = serde_json::json!({
        "name": "Grace Hopper",
        "email": "grace@university.edu",
        "password": "secret123",
        "role": "teacher",
    });
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/users/staff", &token, body.clone()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["role"], "teacher");

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/users/staff", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // a hod without a department is rejected
    let body = serde_json::json!({
        "name": "Heads", "email": "hod@university.edu",
        "password": "secret123", "role": "hod",
    });
    let resp = app
        .oneshot(json_request("POST", "/api/users/staff", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_student_roll_number_unique_per_class() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let admin = factories::admin(db).await;
    let (class_a, _) = factories::class_with_teacher(db).await;
    let (class_b, _) = factories::class_with_teacher(db).await;
    let (token, _) = generate_jwt(admin.id, admin.role);

    let body = serde_json::json!({
        "name": "John Doe", "email": "john@student.edu",
        "roll_number": "2021001", "class_id": class_a.id,
        "password": "student123",
    });
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/users/students", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // same roll in the same class conflicts
    let body = serde_json::json!({
        "name": "Jane Doe", "email": "jane@student.edu",
        "roll_number": "2021001", "class_id": class_a.id,
    });
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/users/students", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // same roll in another class is fine; omitted password is generated
    let body = serde_json::json!({
        "name": "Jane Doe", "email": "jane@student.edu",
        "roll_number": "2021001", "class_id": class_b.id,
    });
    let resp = app
        .oneshot(json_request("POST", "/api/users/students", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("Generated password")
    );
}

fn multipart_request(uri: &str, token: &str, csv: &str, default_password: &str) -> Request<Body> {
    let boundary = "test-boundary-7MA4YWxkTrZu0gW";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"csv_file\"; filename=\"students.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"default_password\"\r\n\r\n\
         {default_password}\r\n\
         --{boundary}--\r\n"
    );
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    with_connect_info(req, [198, 51, 100, 9])
}

#[tokio::test]
async fn test_bulk_import_students_mixed_rows() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let admin = factories::admin(db).await;
    let (class, _) = factories::class_with_teacher(db).await;
    let (token, _) = generate_jwt(admin.id, admin.role);

    let csv = format!(
        "name,email,roll_number,class_name,password\n\
         John Doe,john.doe@example.com,2021001,{class},student123\n\
         Jane Smith,jane.smith@example.com,2021002,{class},\n\
         Ghost Row,ghost@example.com,2021003,NoSuchClass,\n",
        class = class.name
    );

    let resp = app
        .clone()
        .oneshot(multipart_request(
            "/api/users/students/import",
            &token,
            &csv,
            "",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["imported"], 2);
    assert_eq!(json["data"]["failed"], 1);
    assert!(json["data"]["errors"][0]
        .as_str()
        .unwrap()
        .contains("does not exist"));

    let students = user::Model::students_of_class(db, class.id).await.unwrap();
    assert_eq!(students.len(), 2);

    // missing a required column fails fast
    let resp = app
        .oneshot(multipart_request(
            "/api/users/students/import",
            &token,
            "name,email\nA,B\n",
            "",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_students_csv() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let admin = factories::admin(db).await;
    let (class, _) = factories::class_with_teacher(db).await;
    let student = factories::student(db, class.id, "2021042").await;
    let (token, _) = generate_jwt(admin.id, admin.role);

    let resp = app
        .oneshot(bare_request("GET", "/api/users/students/export", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .contains("students_export_")
    );
    let csv = helpers::app::body_text(resp).await;
    assert!(csv.contains(&student.email));
    assert!(csv.contains(&class.name));
}

#[tokio::test]
async fn test_promotion_moves_students_forward_and_out() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let admin = factories::admin(db).await;
    let (token, _) = generate_jwt(admin.id, admin.role);

    // a semester-5 student with a valid next class
    let (class5, _) = factories::class_with_teacher(db).await;
    let next_class = factories::next_semester_class(db, &class5, 5).await;
    let movable = factories::student(db, class5.id, "2021001").await;

    // a final-semester student graduates
    let dept = db::models::department::Model::create(db, "Grad Dept", "GD").await.unwrap();
    let br = db::models::branch::Model::create(db, "Grad Branch", "GB", dept.id).await.unwrap();
    let sem8 = match db::models::semester::Model::find_by_number(db, 8).await.unwrap() {
        Some(s) => s,
        None => db::models::semester::Model::create(db, 8).await.unwrap(),
    };
    let class8 = db::models::class::Model::create(db, "8GB1", "1", sem8.id, br.id)
        .await
        .unwrap();
    let graduating = factories::student(db, class8.id, "2018001").await;

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/users/students/promote",
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["promoted"], 1);
    assert_eq!(json["data"]["moved_to_alumni"], 1);

    let moved = user::Entity::find_by_id(movable.id).one(db).await.unwrap().unwrap();
    assert_eq!(moved.class_id, Some(next_class.id));

    let grad = user::Entity::find_by_id(graduating.id).one(db).await.unwrap().unwrap();
    assert_eq!(grad.status, Status::Alumni);
    assert_eq!(grad.class_id, None);
}

#[tokio::test]
async fn test_users_routes_require_admin() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let teacher = factories::teacher(db).await;
    let (token, _) = generate_jwt(teacher.id, teacher.role);

    let resp = app
        .oneshot(bare_request("GET", "/api/users/students", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // sanity: the factory really made a non-admin
    let row = user::Entity::find()
        .filter(user::Column::Id.eq(teacher.id))
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.role, Role::Teacher);
}
