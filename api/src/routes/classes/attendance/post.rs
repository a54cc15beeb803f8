use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use util::state::AppState;

use super::common::{CreateSessionReq, OverrideReq, SessionResponse};
use crate::{auth::AuthUser, response::ApiResponse};
use db::models::{
    attendance_override::{self, OverrideError, OverrideOutcome},
    class,
    session::{self, LockOutcome},
};
use sea_orm::EntityTrait;

/// POST /api/classes/{class_id}/attendance/sessions
///
/// Mints a new attendance session and renders its QR artifact.
///
/// **Auth**: assigned teacher or admin (router layer).
///
/// **Notes**:
/// - Durations outside the permitted set fall back to 30s rather than 400.
/// - A proxy session requires the stand-in teacher's display name.
/// - Creating a session never invalidates earlier ones for the class.
pub async fn create_session(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CreateSessionReq>,
) -> (StatusCode, Json<ApiResponse<Option<SessionResponse>>>) {
    let db = state.db();

    if class::Entity::find_by_id(class_id)
        .one(db)
        .await
        .ok()
        .flatten()
        .is_none()
    {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Class not found")),
        );
    }

    let is_proxy = body.is_proxy.unwrap_or(false);
    let proxy_name = body
        .proxy_teacher_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if is_proxy && proxy_name.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Please enter the proxy teacher's name")),
        );
    }

    let requested = body
        .duration_seconds
        .unwrap_or(session::DEFAULT_DURATION_SECONDS);
    let now = Utc::now();

    match session::Model::create(db, class_id, claims.sub, requested, is_proxy, proxy_name, now)
        .await
    {
        Ok(row) => {
            let file_stem = if is_proxy {
                format!("proxy_qr_{}_{}", class_id, &row.session_uuid[..8])
            } else {
                format!("qr_class_{class_id}")
            };
            let artifact = util::qr::save_artifact(&row.qr_payload(), &file_stem)
                .map(|p| p.display().to_string());

            let duration = row.duration_seconds;
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    Some(SessionResponse::from_model(row, artifact, 0)),
                    format!("QR generated for this class (expires in {duration}s)"),
                )),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to create session: {e}"))),
        ),
    }
}

/// POST /api/classes/{class_id}/attendance/sessions/{session_id}/lock
///
/// One-way lock that closes the review window early. Locking an already
/// locked session reports success rather than an error.
pub async fn lock_session(
    State(state): State<AppState>,
    Path((class_id, session_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = state.db();

    let Some(sess) = find_class_session(&state, class_id, session_id).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Session not found")),
        );
    };

    match sess.lock(db).await {
        Ok(LockOutcome::Locked) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Session locked")),
        ),
        Ok(LockOutcome::AlreadyLocked) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Session is already locked")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to lock session: {e}"))),
        ),
    }
}

/// POST /api/classes/{class_id}/attendance/sessions/{session_id}/overrides
///
/// Manual correction within the review window.
///
/// **Responses**:
/// - `200` applied, or no-op when the record already matched
/// - `404` unknown session for this class
/// - `409` review window elapsed or session locked
/// - `422` student does not belong to this class
pub async fn apply_override(
    State(state): State<AppState>,
    Path((class_id, session_id)): Path<(i64, i64)>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<OverrideReq>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = state.db();

    let Some(sess) = find_class_session(&state, class_id, session_id).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Session not found")),
        );
    };

    let result = attendance_override::Model::apply(
        db,
        &sess,
        body.student_id,
        claims.sub,
        body.action,
        &body.reason,
        Utc::now(),
    )
    .await;

    match result {
        Ok(OverrideOutcome::Applied) => {
            let msg = match body.action {
                attendance_override::Action::MarkPresent => "Marked student as present",
                attendance_override::Action::MarkAbsent => "Marked student as absent",
            };
            (StatusCode::OK, Json(ApiResponse::success((), msg)))
        }
        Ok(OverrideOutcome::NoChange) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Attendance already matches the requested state")),
        ),
        Err(OverrideError::WindowClosed) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::error(
                "Review window has expired or session is locked",
            )),
        ),
        Err(OverrideError::StudentNotInClass) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::error("Student not found in this class")),
        ),
        Err(OverrideError::Db(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to apply override: {e}"))),
        ),
    }
}

/// Loads a session and checks it belongs to the class in the path.
pub(super) async fn find_class_session(
    state: &AppState,
    class_id: i64,
    session_id: i64,
) -> Option<session::Model> {
    use sea_orm::{ColumnTrait, QueryFilter};
    session::Entity::find()
        .filter(session::Column::Id.eq(session_id))
        .filter(session::Column::ClassId.eq(class_id))
        .one(state.db())
        .await
        .ok()
        .flatten()
}
