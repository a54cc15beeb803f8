//! Semester management (admin-only). Semesters are the numbered steps of the
//! programme; they are toggled active/inactive rather than deleted.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, QueryOrder};
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::response::ApiResponse;
use db::models::semester::{self, Model as Semester};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSemesterReq {
    #[validate(range(min = 1, max = 8, message = "Semester number must be 1-8"))]
    pub number: i32,
}

#[derive(Debug, Deserialize)]
pub struct EditSemesterReq {
    pub active: bool,
}

/// GET /api/semesters
pub async fn list_semesters(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Vec<Semester>>>) {
    match semester::Entity::find()
        .order_by_asc(semester::Column::Number)
        .all(state.db())
        .await
    {
        Ok(rows) => (
            StatusCode::OK,
            Json(ApiResponse::success(rows, "Semesters retrieved")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

/// POST /api/semesters
pub async fn create_semester(
    State(state): State<AppState>,
    Json(req): Json<CreateSemesterReq>,
) -> (StatusCode, Json<ApiResponse<Option<Semester>>>) {
    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Validation failed: {e}"))),
        );
    }
    let db = state.db();

    match Semester::find_by_number(db, req.number).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error("Semester already exists")),
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

    match Semester::create(db, req.number).await {
        Ok(row) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(Some(row), "Semester created")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to create semester: {e}"))),
        ),
    }
}

/// PUT /api/semesters/{semester_id} — toggle the active flag.
pub async fn edit_semester(
    State(state): State<AppState>,
    Path(semester_id): Path<i64>,
    Json(req): Json<EditSemesterReq>,
) -> (StatusCode, Json<ApiResponse<Option<Semester>>>) {
    let db = state.db();

    let Some(existing) = semester::Entity::find_by_id(semester_id)
        .one(db)
        .await
        .ok()
        .flatten()
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Semester not found")),
        );
    };

    let mut active = existing.into_active_model();
    active.active = Set(req.active);

    match active.update(db).await {
        Ok(row) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(row), "Semester updated")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to update semester: {e}"))),
        ),
    }
}

pub fn semester_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_semesters))
        .route("/", post(create_semester))
        .route("/{semester_id}", put(edit_semester))
}
