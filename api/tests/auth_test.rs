mod helpers;

use axum::http::StatusCode;
use tower::ServiceExt;

use helpers::app::{body_json, make_test_app};

#[tokio::test]
async fn test_login_happy_path() {
    let (app, app_state) = make_test_app().await;
    let teacher = db::factories::teacher(app_state.db()).await;

    let body = serde_json::json!({ "email": teacher.email, "password": "password" });
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["role"], "teacher");
    assert!(json["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_login_wrong_password_rejected() {
    let (app, app_state) = make_test_app().await;
    let teacher = db::factories::teacher(app_state.db()).await;

    let body = serde_json::json!({ "email": teacher.email, "password": "not-the-password" });
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_unknown_email_indistinguishable() {
    let (app, _app_state) = make_test_app().await;

    let body = serde_json::json!({ "email": "ghost@test.edu", "password": "password" });
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(resp).await;
    assert_eq!(json["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let (app, _app_state) = make_test_app().await;

    let req = axum::http::Request::builder()
        .method("GET")
        .uri("/api/departments")
        .body(axum::body::Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
