use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use util::state::AppState;

use super::common::ClassReq;
use crate::response::ApiResponse;
use db::models::{
    class::{self, Model as Class},
    teacher_class,
    user::{self, Role},
};
use sea_orm::EntityTrait;

/// POST /api/classes
///
/// Creates a class. Names are globally unique ("5CSE1" style).
pub async fn create_class(
    State(state): State<AppState>,
    Json(req): Json<ClassReq>,
) -> (StatusCode, Json<ApiResponse<Option<Class>>>) {
    let db = state.db();

    if req.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Name is required")),
        );
    }

    match Class::find_by_name(db, &req.name).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error("Class with this name already exists")),
            );
        }
        Ok(None) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    }

    match Class::create(db, &req.name, &req.division, req.semester_id, req.branch_id).await {
        Ok(row) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(Some(row), "Class created")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to create class: {e}"))),
        ),
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignTeacherReq {
    pub teacher_id: i64,
}

/// POST /api/classes/{class_id}/teachers
///
/// Assigns a teacher to a class. Duplicate assignments are a conflict, not
/// an error that re-writes the row.
pub async fn assign_teacher(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(req): Json<AssignTeacherReq>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = state.db();

    let teacher = match user::Entity::find_by_id(req.teacher_id).one(db).await {
        Ok(Some(u)) if u.role == Role::Teacher => u,
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Teacher not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    match teacher_class::Model::exists(db, teacher.id, class_id).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error(
                    "Teacher is already assigned to this class",
                )),
            );
        }
        Ok(false) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    }

    match teacher_class::Model::assign(db, teacher.id, class_id).await {
        Ok(_) => (
            StatusCode::CREATED,
            Json(ApiResponse::success((), "Teacher assigned to class")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to assign teacher: {e}"))),
        ),
    }
}
