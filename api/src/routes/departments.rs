//! Department management (admin-only).

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
use db::models::department::{self, Model as Department};

#[derive(Debug, Deserialize, Validate)]
pub struct DepartmentReq {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 16, message = "Code must be 1-16 characters"))]
    pub code: String,
}

/// GET /api/departments — list all departments ordered by name.
pub async fn list_departments(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Vec<Department>>>) {
    match department::Entity::find()
        .order_by_asc(department::Column::Name)
        .all(state.db())
        .await
    {
        Ok(rows) => (
            StatusCode::OK,
            Json(ApiResponse::success(rows, "Departments retrieved")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

/// POST /api/departments — create a department. Codes are uppercased and
/// must be unique.
pub async fn create_department(
    State(state): State<AppState>,
    Json(req): Json<DepartmentReq>,
) -> (StatusCode, Json<ApiResponse<Option<Department>>>) {
    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Validation failed: {e}"))),
        );
    }
    let db = state.db();

    let code = req.code.trim().to_uppercase();
    match department::Entity::find()
        .filter(department::Column::Code.eq(code.clone()))
        .one(db)
        .await
    {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error(
                    "Department with this code already exists",
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

    match Department::create(db, &req.name, &code).await {
        Ok(row) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(Some(row), "Department created")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!(
                "Failed to create department: {e}"
            ))),
        ),
    }
}

/// PUT /api/departments/{department_id} — edit name/code.
pub async fn edit_department(
    State(state): State<AppState>,
    Path(department_id): Path<i64>,
    Json(req): Json<DepartmentReq>,
) -> (StatusCode, Json<ApiResponse<Option<Department>>>) {
    let db = state.db();

    let Some(existing) = department::Entity::find_by_id(department_id)
        .one(db)
        .await
        .ok()
        .flatten()
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Department not found")),
        );
    };

    let mut active = existing.into_active_model();
    active.name = Set(req.name.trim().to_owned());
    active.code = Set(req.code.trim().to_uppercase());

    match active.update(db).await {
        Ok(row) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(row), "Department updated")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!(
                "Failed to update department: {e}"
            ))),
        ),
    }
}

/// DELETE /api/departments/{department_id}
///
/// Refused while the department still has branches.
pub async fn delete_department(
    State(state): State<AppState>,
    Path(department_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = state.db();

    match Department::has_branches(db, department_id).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error(
                    "Cannot delete department with existing branches",
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

    match department::Entity::delete_by_id(department_id).exec(db).await {
        Ok(res) if res.rows_affected > 0 => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Department deleted")),
        ),
        Ok(_) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Department not found")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!(
                "Failed to delete department: {e}"
            ))),
        ),
    }
}

pub fn department_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_departments))
        .route("/", post(create_department))
        .route("/{department_id}", put(edit_department))
        .route("/{department_id}", delete(delete_department))
}
