use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use util::state::AppState;

use crate::routes::classes::attendance::common::SessionResponse;
use crate::{auth::AuthUser, response::ApiResponse};
use db::models::{
    attendance_record::{Model as AttendanceRecord, RedeemError, RedeemSuccess},
    class, session,
};
use sea_orm::EntityTrait;

#[derive(Debug, Deserialize)]
pub struct MarkAttendanceReq {
    pub qr_data: String,
}

/// POST /api/attendance/mark
///
/// Student redemption of a scanned payload.
///
/// **Auth**: students only (router layer); the actor identity comes from the
/// token, never from the request body.
///
/// **Responses**:
/// - `200` both for a fresh record and an already-recorded repeat scan —
///   callers cannot distinguish the two
/// - `400` invalid payload, malformed expiry, or expired session
/// - `404` unknown session identifier
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<MarkAttendanceReq>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = state.db();
    let now = Utc::now();

    match AttendanceRecord::redeem(db, &body.qr_data, claims.sub, now).await {
        Ok(RedeemSuccess::Recorded { class_name }) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                (),
                format!(
                    "Attendance marked for {} on {}",
                    class_name,
                    now.format("%Y-%m-%d %H:%M")
                ),
            )),
        ),
        Ok(RedeemSuccess::AlreadyRecorded) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                (),
                "Attendance already recorded for this session",
            )),
        ),
        Err(e @ RedeemError::SessionNotFound) => {
            (StatusCode::NOT_FOUND, Json(ApiResponse::error(e.to_string())))
        }
        Err(
            e @ (RedeemError::InvalidPayload
            | RedeemError::MalformedExpiry
            | RedeemError::SessionExpired),
        ) => (StatusCode::BAD_REQUEST, Json(ApiResponse::error(e.to_string()))),
        Err(RedeemError::Db(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to record attendance: {e}"))),
        ),
    }
}

#[derive(Debug, Deserialize)]
pub struct ProxySessionReq {
    pub class_id: i64,
    pub duration_seconds: Option<i32>,
    pub proxy_teacher_name: String,
}

/// POST /api/attendance/proxy
///
/// Proxy-lecture issuance: any teacher may mint a session for any class when
/// covering for a colleague, recording the stand-in's display name. Longer
/// durations are permitted than for ordinary sessions.
pub async fn create_proxy_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<ProxySessionReq>,
) -> (StatusCode, Json<ApiResponse<Option<SessionResponse>>>) {
    let db = state.db();

    let proxy_name = body.proxy_teacher_name.trim();
    if proxy_name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Please enter the proxy teacher's name")),
        );
    }

    let class = match class::Entity::find_by_id(body.class_id).one(db).await {
        Ok(Some(c)) => c,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Class not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let requested = body
        .duration_seconds
        .unwrap_or(session::DEFAULT_DURATION_SECONDS);

    match session::Model::create(
        db,
        class.id,
        claims.sub,
        requested,
        true,
        Some(proxy_name),
        Utc::now(),
    )
    .await
    {
        Ok(row) => {
            let file_stem = format!("proxy_qr_{}_{}", class.id, &row.session_uuid[..8]);
            let artifact = util::qr::save_artifact(&row.qr_payload(), &file_stem)
                .map(|p| p.display().to_string());

            let duration = row.duration_seconds;
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    Some(SessionResponse::from_model(row, artifact, 0)),
                    format!(
                        "Proxy QR generated for {} (expires in {}s). Proxy teacher: {}",
                        class.name, duration, proxy_name
                    ),
                )),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to create session: {e}"))),
        ),
    }
}
