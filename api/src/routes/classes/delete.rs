use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::EntityTrait;
use util::state::AppState;

use crate::response::ApiResponse;
use db::models::{class, teacher_class};

/// DELETE /api/classes/{class_id}
///
/// Refused while students are still enrolled.
pub async fn delete_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = state.db();

    match class::Model::has_students(db, class_id).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error(
                    "Cannot delete class with existing students",
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

    match class::Entity::delete_by_id(class_id).exec(db).await {
        Ok(res) if res.rows_affected > 0 => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Class deleted")),
        ),
        Ok(_) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Class not found")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to delete class: {e}"))),
        ),
    }
}

/// DELETE /api/classes/{class_id}/teachers/{teacher_id}
pub async fn remove_teacher(
    State(state): State<AppState>,
    Path((class_id, teacher_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    match teacher_class::Model::remove(state.db(), teacher_id, class_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Class assignment removed")),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Assignment not found")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!(
                "Failed to remove assignment: {e}"
            ))),
        ),
    }
}
