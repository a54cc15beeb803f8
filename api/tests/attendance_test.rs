mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use tower::ServiceExt;

use api::auth::generate_jwt;
use db::factories;
use db::models::{attendance_record, session};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use helpers::app::{bare_request, body_json, json_request, make_test_app};

#[tokio::test]
async fn test_create_session_as_assigned_teacher() {
    let (app, app_state) = make_test_app().await;
    let (class, teacher) = factories::class_with_teacher(app_state.db()).await;

    let (token, _) = generate_jwt(teacher.id, teacher.role);
    let uri = format!("/api/classes/{}/attendance/sessions", class.id);
    let body = serde_json::json!({ "duration_seconds": 60 });

    let resp = app.oneshot(json_request("POST", &uri, &token, body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["duration_seconds"], 60);
    assert_eq!(json["data"]["locked"], false);

    // payload is <uuid>|<rfc3339 expiry>, pipe-separated
    let payload = json["data"]["qr_payload"].as_str().unwrap();
    let (token_part, expiry_part) = payload.split_once('|').unwrap();
    assert_eq!(token_part, json["data"]["session_uuid"].as_str().unwrap());
    assert!(chrono::DateTime::parse_from_rfc3339(expiry_part).is_ok());
}

#[tokio::test]
async fn test_create_session_coerces_bad_duration() {
    let (app, app_state) = make_test_app().await;
    let (class, teacher) = factories::class_with_teacher(app_state.db()).await;

    let (token, _) = generate_jwt(teacher.id, teacher.role);
    let uri = format!("/api/classes/{}/attendance/sessions", class.id);
    // 300s is proxy-only; an ordinary session falls back to 30s
    let body = serde_json::json!({ "duration_seconds": 300 });

    let resp = app.oneshot(json_request("POST", &uri, &token, body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["duration_seconds"], 30);
}

#[tokio::test]
async fn test_create_session_forbidden_for_unassigned_teacher() {
    let (app, app_state) = make_test_app().await;
    let (class, _teacher) = factories::class_with_teacher(app_state.db()).await;
    let outsider = factories::teacher(app_state.db()).await;

    let (token, _) = generate_jwt(outsider.id, outsider.role);
    let uri = format!("/api/classes/{}/attendance/sessions", class.id);

    let resp = app
        .oneshot(json_request("POST", &uri, &token, serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_mark_attendance_idempotent_over_http() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let (class, teacher) = factories::class_with_teacher(db).await;
    let student = factories::student(db, class.id, "2021001").await;

    let sess = session::Model::create(db, class.id, teacher.id, 60, false, None, Utc::now())
        .await
        .unwrap();
    let (token, _) = generate_jwt(student.id, student.role);
    let body = serde_json::json!({ "qr_data": sess.qr_payload() });

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/attendance/mark", &token, body.clone()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    assert!(json["message"].as_str().unwrap().contains(&class.name));

    // second scan also succeeds, and no second record appears
    let resp = app
        .oneshot(json_request("POST", "/api/attendance/mark", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["success"], true);

    let count = attendance_record::Entity::find()
        .filter(attendance_record::Column::SessionId.eq(sess.id))
        .count(db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_mark_attendance_error_statuses() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let (class, teacher) = factories::class_with_teacher(db).await;
    let student = factories::student(db, class.id, "2021001").await;
    let (token, _) = generate_jwt(student.id, student.role);

    // no separator -> 400
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/attendance/mark",
            &token,
            serde_json::json!({ "qr_data": "garbage" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // unparsable expiry -> 400
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/attendance/mark",
            &token,
            serde_json::json!({ "qr_data": "some-token|not-a-date" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // unknown session -> 404
    let future = (Utc::now() + Duration::minutes(5)).to_rfc3339();
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/attendance/mark",
            &token,
            serde_json::json!({ "qr_data": format!("deadbeef-0000|{future}") }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // stored expiry lapsed -> 400 even with a fresh-looking embedded expiry
    let stale = session::Model::create(
        db,
        class.id,
        teacher.id,
        30,
        false,
        None,
        Utc::now() - Duration::seconds(45),
    )
    .await
    .unwrap();
    let forged = format!("{}|{future}", stale.session_uuid);
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/attendance/mark",
            &token,
            serde_json::json!({ "qr_data": forged }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let count = attendance_record::Entity::find()
        .filter(attendance_record::Column::UserId.eq(student.id))
        .count(db)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_mark_attendance_forbidden_for_teachers() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let (class, teacher) = factories::class_with_teacher(db).await;

    let sess = session::Model::create(db, class.id, teacher.id, 60, false, None, Utc::now())
        .await
        .unwrap();
    let (token, _) = generate_jwt(teacher.id, teacher.role);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/attendance/mark",
            &token,
            serde_json::json!({ "qr_data": sess.qr_payload() }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_override_then_lock_then_window_closed() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let (class, teacher) = factories::class_with_teacher(db).await;
    let student = factories::student(db, class.id, "2021001").await;

    let sess = session::Model::create(db, class.id, teacher.id, 30, false, None, Utc::now())
        .await
        .unwrap();
    let (token, _) = generate_jwt(teacher.id, teacher.role);
    let uri = format!(
        "/api/classes/{}/attendance/sessions/{}/overrides",
        class.id, sess.id
    );

    // mark present manually
    let body = serde_json::json!({
        "student_id": student.id,
        "action": "mark_present",
        "reason": "was in the lab",
    });
    let resp = app
        .clone()
        .oneshot(json_request("POST", &uri, &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        attendance_record::Model::find(db, sess.id, student.id)
            .await
            .unwrap()
            .is_some()
    );

    // lock the session (well inside the hour)
    let lock_uri = format!(
        "/api/classes/{}/attendance/sessions/{}/lock",
        class.id, sess.id
    );
    let resp = app
        .clone()
        .oneshot(bare_request("POST", &lock_uri, &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // locking again is still a success
    let resp = app
        .clone()
        .oneshot(bare_request("POST", &lock_uri, &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "Session is already locked");

    // any further override is refused
    let body = serde_json::json!({
        "student_id": student.id,
        "action": "mark_absent",
        "reason": "second thoughts",
    });
    let resp = app
        .oneshot(json_request("POST", &uri, &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_override_student_from_other_class() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let (class, teacher) = factories::class_with_teacher(db).await;
    let (other_class, _) = factories::class_with_teacher(db).await;
    let outsider = factories::student(db, other_class.id, "2021050").await;

    let sess = session::Model::create(db, class.id, teacher.id, 30, false, None, Utc::now())
        .await
        .unwrap();
    let (token, _) = generate_jwt(teacher.id, teacher.role);
    let uri = format!(
        "/api/classes/{}/attendance/sessions/{}/overrides",
        class.id, sess.id
    );

    let body = serde_json::json!({
        "student_id": outsider.id,
        "action": "mark_present",
        "reason": "",
    });
    let resp = app
        .oneshot(json_request("POST", &uri, &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_proxy_session_allows_long_duration_and_any_class() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let (class, _owner) = factories::class_with_teacher(db).await;
    let covering = factories::teacher(db).await; // not assigned to the class

    let (token, _) = generate_jwt(covering.id, covering.role);
    let body = serde_json::json!({
        "class_id": class.id,
        "duration_seconds": 300,
        "proxy_teacher_name": "Dr. Stand-In",
    });

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/attendance/proxy", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["duration_seconds"], 300);
    assert_eq!(json["data"]["is_proxy"], true);
    assert_eq!(json["data"]["proxy_teacher_name"], "Dr. Stand-In");

    // the stand-in's name is required
    let body = serde_json::json!({ "class_id": class.id, "proxy_teacher_name": "  " });
    let resp = app
        .oneshot(json_request("POST", "/api/attendance/proxy", &token, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_latest_session_roster_and_exports() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let (class, teacher) = factories::class_with_teacher(db).await;
    let present = factories::student(db, class.id, "2021001").await;
    let _absent = factories::student(db, class.id, "2021002").await;

    let sess = session::Model::create(db, class.id, teacher.id, 60, false, None, Utc::now())
        .await
        .unwrap();
    attendance_record::Model::redeem(db, &sess.qr_payload(), present.id, Utc::now())
        .await
        .unwrap();

    let (token, _) = generate_jwt(teacher.id, teacher.role);

    let uri = format!("/api/classes/{}/attendance/sessions/latest", class.id);
    let resp = app
        .clone()
        .oneshot(bare_request("GET", &uri, &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["review_window_open"], true);
    let roster = json["data"]["roster"].as_array().unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster.iter().filter(|r| r["present"] == true).count(), 1);

    // CSV export carries one column for the session and Present/Absent cells
    let uri = format!("/api/classes/{}/attendance/records/export", class.id);
    let resp = app
        .clone()
        .oneshot(bare_request("GET", &uri, &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let csv = helpers::app::body_text(resp).await;
    assert!(csv.starts_with("Student Name,Roll Number,Email"));
    assert!(csv.contains("Present"));
    assert!(csv.contains("Absent"));

    // PDF report is a real PDF document
    let uri = format!(
        "/api/classes/{}/attendance/sessions/{}/report.pdf",
        class.id, sess.id
    );
    let resp = app
        .oneshot(bare_request("GET", &uri, &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/pdf");
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_student_dashboard_reflects_marks() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let (class, teacher) = factories::class_with_teacher(db).await;
    let student = factories::student(db, class.id, "2021001").await;

    let attended = session::Model::create(db, class.id, teacher.id, 60, false, None, Utc::now())
        .await
        .unwrap();
    let _missed = session::Model::create(db, class.id, teacher.id, 60, false, None, Utc::now())
        .await
        .unwrap();
    attendance_record::Model::redeem(db, &attended.qr_payload(), student.id, Utc::now())
        .await
        .unwrap();

    let (token, _) = generate_jwt(student.id, student.role);
    let resp = app
        .oneshot(bare_request("GET", "/api/me/attendance", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["total_sessions"], 2);
    assert_eq!(json["data"]["attended_sessions"], 1);
    assert_eq!(json["data"]["attendance_percentage"], 50.0);
    assert_eq!(json["data"]["recent"].as_array().unwrap().len(), 2);
}
