use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::{EntityTrait, QueryOrder};
use util::state::AppState;

use super::common::{ClassResponse, to_responses};
use crate::{auth::AuthUser, response::ApiResponse};
use db::models::{class, teacher_class, user};

/// GET /api/classes
///
/// List all classes with resolved semester/branch/department names and
/// student counts. Admin-only (router layer).
pub async fn list_classes(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Vec<ClassResponse>>>) {
    let db = state.db();

    let rows = match class::Entity::find()
        .order_by_asc(class::Column::Name)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    match to_responses(db, rows).await {
        Ok(resp) => (
            StatusCode::OK,
            Json(ApiResponse::success(resp, "Classes retrieved")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

/// GET /api/classes/mine
///
/// The classes assigned to the calling teacher, for the teacher dashboard.
pub async fn my_classes(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<ClassResponse>>>) {
    let db = state.db();

    let rows = match teacher_class::Model::classes_of_teacher(db, claims.sub).await {
        Ok(rows) => rows,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    match to_responses(db, rows).await {
        Ok(resp) => (
            StatusCode::OK,
            Json(ApiResponse::success(resp, "Classes retrieved")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

/// GET /api/classes/{class_id}/students
///
/// Roster of a class ordered by roll number.
pub async fn list_class_students(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Vec<user::Model>>>) {
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

    match user::Model::students_of_class(db, class_id).await {
        Ok(students) => (
            StatusCode::OK,
            Json(ApiResponse::success(students, "Students retrieved")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}
