//! Branch management (admin-only). A branch lives inside a department; its
//! code only needs to be unique within that department.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder};
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::response::ApiResponse;
use db::models::branch::{self, Model as Branch};
use db::models::department;

#[derive(Debug, Deserialize, Validate)]
pub struct BranchReq {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 16, message = "Code must be 1-16 characters"))]
    pub code: String,
    pub department_id: i64,
}

/// GET /api/branches — all branches, grouped by department then name.
pub async fn list_branches(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Vec<Branch>>>) {
    match branch::Entity::find()
        .order_by_asc(branch::Column::DepartmentId)
        .order_by_asc(branch::Column::Name)
        .all(state.db())
        .await
    {
        Ok(rows) => (
            StatusCode::OK,
            Json(ApiResponse::success(rows, "Branches retrieved")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

/// POST /api/branches
pub async fn create_branch(
    State(state): State<AppState>,
    Json(req): Json<BranchReq>,
) -> (StatusCode, Json<ApiResponse<Option<Branch>>>) {
    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Validation failed: {e}"))),
        );
    }
    let db = state.db();

    match department::Entity::find_by_id(req.department_id).one(db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Department not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    }

    let code = req.code.trim().to_uppercase();
    let duplicate = branch::Entity::find()
        .filter(branch::Column::Code.eq(code.clone()))
        .filter(branch::Column::DepartmentId.eq(req.department_id))
        .one(db)
        .await;
    match duplicate {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error(
                    "Branch with this code already exists in this department",
                )),
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

    match Branch::create(db, &req.name, &code, req.department_id).await {
        Ok(row) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(Some(row), "Branch created")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to create branch: {e}"))),
        ),
    }
}

/// PUT /api/branches/{branch_id}
pub async fn edit_branch(
    State(state): State<AppState>,
    Path(branch_id): Path<i64>,
    Json(req): Json<BranchReq>,
) -> (StatusCode, Json<ApiResponse<Option<Branch>>>) {
    let db = state.db();

    let Some(existing) = branch::Entity::find_by_id(branch_id).one(db).await.ok().flatten()
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Branch not found")),
        );
    };

    let mut active = existing.into_active_model();
    active.name = Set(req.name.trim().to_owned());
    active.code = Set(req.code.trim().to_uppercase());
    active.department_id = Set(req.department_id);

    match active.update(db).await {
        Ok(row) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(row), "Branch updated")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to update branch: {e}"))),
        ),
    }
}

/// DELETE /api/branches/{branch_id} — refused while classes exist.
pub async fn delete_branch(
    State(state): State<AppState>,
    Path(branch_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = state.db();

    match Branch::has_classes(db, branch_id).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error(
                    "Cannot delete branch with existing classes",
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

    match branch::Entity::delete_by_id(branch_id).exec(db).await {
        Ok(res) if res.rows_affected > 0 => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Branch deleted")),
        ),
        Ok(_) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Branch not found")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to delete branch: {e}"))),
        ),
    }
}

pub fn branch_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_branches))
        .route("/", post(create_branch))
        .route("/{branch_id}", put(edit_branch))
        .route("/{branch_id}", delete(delete_branch))
}
