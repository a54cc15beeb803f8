use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel};
use util::state::AppState;

use super::common::ClassReq;
use crate::response::ApiResponse;
use db::models::class::{self, Model as Class};

/// PUT /api/classes/{class_id}
pub async fn edit_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(req): Json<ClassReq>,
) -> (StatusCode, Json<ApiResponse<Option<Class>>>) {
    let db = state.db();

    let Some(existing) = class::Entity::find_by_id(class_id).one(db).await.ok().flatten()
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Class not found")),
        );
    };

    let mut active = existing.into_active_model();
    active.name = Set(req.name.trim().to_owned());
    active.division = Set(req.division.trim().to_owned());
    active.semester_id = Set(req.semester_id);
    active.branch_id = Set(req.branch_id);

    match active.update(db).await {
        Ok(row) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(row), "Class updated")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to update class: {e}"))),
        ),
    }
}
