use axum::{
    Extension, Json,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel};
use std::net::SocketAddr;
use util::state::AppState;
use validator::Validate;

use super::common::{EditStaffReq, EditStudentReq, UserResponse};
use super::post::log_password_change;
use crate::{auth::AuthUser, response::ApiResponse};
use db::models::{
    password_log::{Action as LogAction, Method as LogMethod},
    user::{self, Model as User, Role},
};

/// PUT /api/users/staff/{user_id}
///
/// Edits a staff account; an included password resets it and is audited.
pub async fn edit_staff(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<EditStaffReq>,
) -> (StatusCode, Json<ApiResponse<Option<UserResponse>>>) {
    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Validation failed: {e}"))),
        );
    }
    let db = state.db();

    let existing = match user::Entity::find_by_id(user_id).one(db).await {
        Ok(Some(u)) if matches!(u.role, Role::Teacher | Role::Hod | Role::Principal) => u,
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Staff account not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };
    let role = existing.role;

    let mut active = existing.into_active_model();
    active.name = Set(req.name.trim().to_owned());
    active.email = Set(req.email.trim().to_lowercase());
    let password_changed = match req.password.as_deref().filter(|p| !p.is_empty()) {
        Some(p) => {
            let hash = match User::hash_password(p) {
                Ok(hash) => hash,
                Err(e) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ApiResponse::error(e.to_string())),
                    );
                }
            };
            active.password_hash = Set(hash);
            true
        }
        None => false,
    };
    active.updated_at = Set(Utc::now());

    match active.update(db).await {
        Ok(updated) => {
            if password_changed {
                log_password_change(
                    &state,
                    updated.id,
                    claims.sub,
                    LogAction::Updated,
                    LogMethod::Manual,
                    &headers,
                    addr,
                    &format!("{role} password updated by admin"),
                )
                .await;
            }
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    Some(updated.into()),
                    "Staff account updated",
                )),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to update account: {e}"))),
        ),
    }
}

/// PUT /api/users/students/{user_id}
pub async fn edit_student(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<EditStudentReq>,
) -> (StatusCode, Json<ApiResponse<Option<UserResponse>>>) {
    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Validation failed: {e}"))),
        );
    }
    let db = state.db();

    let existing = match user::Entity::find_by_id(user_id).one(db).await {
        Ok(Some(u)) if u.role == Role::Student => u,
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Student not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let mut active = existing.into_active_model();
    active.name = Set(req.name.trim().to_owned());
    active.email = Set(req.email.trim().to_lowercase());
    active.roll_number = Set(Some(req.roll_number.trim().to_owned()));
    active.class_id = Set(Some(req.class_id));
    if let Some(status) = req.status {
        active.status = Set(status);
    }
    let password_changed = match req.password.as_deref().filter(|p| !p.is_empty()) {
        Some(p) => {
            let hash = match User::hash_password(p) {
                Ok(hash) => hash,
                Err(e) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ApiResponse::error(e.to_string())),
                    );
                }
            };
            active.password_hash = Set(hash);
            true
        }
        None => false,
    };
    active.updated_at = Set(Utc::now());

    match active.update(db).await {
        Ok(updated) => {
            if password_changed {
                log_password_change(
                    &state,
                    updated.id,
                    claims.sub,
                    LogAction::Updated,
                    LogMethod::Manual,
                    &headers,
                    addr,
                    "Student password updated by admin",
                )
                .await;
            }
            (
                StatusCode::OK,
                Json(ApiResponse::success(Some(updated.into()), "Student updated")),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to update student: {e}"))),
        ),
    }
}
