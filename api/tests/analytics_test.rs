mod helpers;

use axum::http::StatusCode;
use chrono::Utc;
use tower::ServiceExt;

use api::auth::generate_jwt;
use db::factories;
use db::models::{attendance_record, session};
use sea_orm::EntityTrait;

use helpers::app::{bare_request, body_json, make_test_app};

#[tokio::test]
async fn test_admin_overview_counts() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let admin = factories::admin(db).await;
    let (class, teacher) = factories::class_with_teacher(db).await;
    factories::student(db, class.id, "2021001").await;
    factories::student(db, class.id, "2021002").await;
    session::Model::create(db, class.id, teacher.id, 30, false, None, Utc::now())
        .await
        .unwrap();

    let (token, _) = generate_jwt(admin.id, admin.role);
    let resp = app
        .oneshot(bare_request("GET", "/api/analytics/admin", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["data"]["departments"], 1);
    assert_eq!(json["data"]["classes"], 1);
    assert_eq!(json["data"]["teachers"], 1);
    assert_eq!(json["data"]["students"], 2);
    assert_eq!(json["data"]["active_students"], 2);
    assert_eq!(json["data"]["recent_sessions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_hod_overview_scoped_to_department() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();

    // the department the HOD heads, with one attended session
    let (class, teacher) = factories::class_with_teacher(db).await;
    let student = factories::student(db, class.id, "2021001").await;
    let sess = session::Model::create(db, class.id, teacher.id, 60, false, None, Utc::now())
        .await
        .unwrap();
    attendance_record::Model::redeem(db, &sess.qr_payload(), student.id, Utc::now())
        .await
        .unwrap();

    // an unrelated department that must not leak into the numbers
    let (other_class, _) = factories::class_with_teacher(db).await;
    factories::student(db, other_class.id, "2021099").await;

    let branch = db::models::branch::Entity::find_by_id(class.branch_id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let hod = factories::hod(db, branch.department_id).await;

    let (token, _) = generate_jwt(hod.id, hod.role);
    let resp = app
        .oneshot(bare_request("GET", "/api/analytics/hod", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["data"]["classes"], 1);
    assert_eq!(json["data"]["students"], 1);
    assert_eq!(json["data"]["teachers"], 1);
    assert_eq!(json["data"]["class_attendance"][0]["total_attendance"], 1);
    assert_eq!(json["data"]["recent_sessions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_hod_overview_rejected_for_other_roles() {
    let (app, app_state) = make_test_app().await;
    let teacher = factories::teacher(app_state.db()).await;
    let (token, _) = generate_jwt(teacher.id, teacher.role);

    let resp = app
        .oneshot(bare_request("GET", "/api/analytics/hod", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_principal_overview_breaks_down_departments() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let principal = factories::principal(db).await;

    let (class_a, _) = factories::class_with_teacher(db).await;
    factories::student(db, class_a.id, "2021001").await;
    let (class_b, _) = factories::class_with_teacher(db).await;
    factories::student(db, class_b.id, "2021002").await;
    factories::student(db, class_b.id, "2021003").await;

    let (token, _) = generate_jwt(principal.id, principal.role);
    let resp = app
        .oneshot(bare_request("GET", "/api/analytics/principal", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["data"]["departments"], 2);
    assert_eq!(json["data"]["students"], 3);

    let dept_stats = json["data"]["department_stats"].as_array().unwrap();
    assert_eq!(dept_stats.len(), 2);
    let total: i64 = dept_stats
        .iter()
        .map(|d| d["students"].as_i64().unwrap())
        .sum();
    assert_eq!(total, 3);
}
