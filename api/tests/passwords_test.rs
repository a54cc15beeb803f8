mod helpers;

use axum::http::StatusCode;
use tower::ServiceExt;

use api::auth::generate_jwt;
use db::factories;
use db::models::user;
use sea_orm::EntityTrait;

use helpers::app::{bare_request, body_json, json_request, make_test_app};

#[tokio::test]
async fn test_manual_reset_changes_credentials_and_audits() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let admin = factories::admin(db).await;
    let teacher = factories::teacher(db).await;
    let (token, _) = generate_jwt(admin.id, admin.role);

    let body = serde_json::json!({
        "user_id": teacher.id,
        "password_type": "manual",
        "new_password": "brand-new-pass",
    });
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/passwords/reset", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["new_password"], "brand-new-pass");

    let updated = user::Entity::find_by_id(teacher.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.verify_password("brand-new-pass"));
    assert!(!updated.verify_password("password"));

    // the change shows up in the audit trail
    let resp = app
        .oneshot(bare_request("GET", "/api/passwords", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let changes = json["data"]["recent_changes"].as_array().unwrap();
    assert!(!changes.is_empty());
    assert_eq!(changes[0]["user_id"], teacher.id);
    assert_eq!(changes[0]["action"], "reset");
    assert_eq!(changes[0]["method"], "manual");
}

#[tokio::test]
async fn test_auto_reset_generates_password() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let admin = factories::admin(db).await;
    let teacher = factories::teacher(db).await;
    let (token, _) = generate_jwt(admin.id, admin.role);

    let body = serde_json::json!({ "user_id": teacher.id, "password_type": "auto" });
    let resp = app
        .oneshot(json_request("POST", "/api/passwords/reset", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;

    let generated = json["data"]["new_password"].as_str().unwrap();
    assert_eq!(generated.len(), 8);

    let updated = user::Entity::find_by_id(teacher.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.verify_password(generated));
}

#[tokio::test]
async fn test_manual_reset_requires_a_password() {
    let (app, app_state) = make_test_app().await;
    let admin = factories::admin(app_state.db()).await;
    let teacher = factories::teacher(app_state.db()).await;
    let (token, _) = generate_jwt(admin.id, admin.role);

    let body = serde_json::json!({ "user_id": teacher.id, "password_type": "manual" });
    let resp = app
        .oneshot(json_request("POST", "/api/passwords/reset", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_reset_by_role() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let admin = factories::admin(db).await;
    let t1 = factories::teacher(db).await;
    let t2 = factories::teacher(db).await;
    let (token, _) = generate_jwt(admin.id, admin.role);

    let body = serde_json::json!({
        "role": "teacher",
        "password_type": "manual",
        "new_password": "everyone-new",
    });
    let resp = app
        .oneshot(json_request("POST", "/api/passwords/bulk-reset", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert!(json["message"].as_str().unwrap().contains("2 teachers"));

    for id in [t1.id, t2.id] {
        let updated = user::Entity::find_by_id(id).one(db).await.unwrap().unwrap();
        assert!(updated.verify_password("everyone-new"));
    }
}

#[tokio::test]
async fn test_password_template_download() {
    let (app, app_state) = make_test_app().await;
    let admin = factories::admin(app_state.db()).await;
    let (token, _) = generate_jwt(admin.id, admin.role);

    let resp = app
        .oneshot(bare_request("GET", "/api/passwords/template", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let csv = helpers::app::body_text(resp).await;
    assert!(csv.starts_with("email,password"));
}
