use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;
use util::state::AppState;

use crate::response::ApiResponse;
use crate::routes::users::common::UserResponse;
use db::models::{password_log, user};

#[derive(Debug, Serialize)]
pub struct PasswordLogEntry {
    pub id: i64,
    pub user_id: i64,
    pub user_name: Option<String>,
    pub admin_id: i64,
    pub action: String,
    pub method: String,
    pub ip_address: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Default)]
pub struct PasswordOverview {
    pub users: Vec<UserResponse>,
    pub recent_changes: Vec<PasswordLogEntry>,
}

/// GET /api/passwords
///
/// Teachers and students plus the 20 most recent credential changes.
pub async fn password_overview(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<PasswordOverview>>) {
    let db = state.db();

    let users = match user::Entity::find()
        .filter(user::Column::Role.is_in([user::Role::Teacher, user::Role::Student]))
        .order_by_asc(user::Column::Role)
        .order_by_asc(user::Column::Name)
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

    let recent = match password_log::Model::recent(db, 20).await {
        Ok(rows) => rows,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    // Resolve names only for the users appearing in the page of log rows.
    let ids: Vec<i64> = recent.iter().map(|r| r.user_id).collect();
    let mut names: HashMap<i64, String> = HashMap::new();
    if !ids.is_empty() {
        if let Ok(rows) = user::Entity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(db)
            .await
        {
            for u in rows {
                names.insert(u.id, u.name);
            }
        }
    }

    let overview = PasswordOverview {
        users: users.into_iter().map(UserResponse::from).collect(),
        recent_changes: recent
            .into_iter()
            .map(|r| PasswordLogEntry {
                user_name: names.get(&r.user_id).cloned(),
                id: r.id,
                user_id: r.user_id,
                admin_id: r.admin_id,
                action: r.action.to_string(),
                method: r.method.to_string(),
                ip_address: r.ip_address,
                notes: r.notes,
                created_at: r.created_at.to_rfc3339(),
            })
            .collect(),
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(overview, "Password overview retrieved")),
    )
}

/// GET /api/passwords/template
///
/// Sample CSV for the bulk password upload. Empty cells auto-generate.
pub async fn password_template() -> (StatusCode, (HeaderMap, String)) {
    let csv = "\
email,password
teacher1@university.edu,newpassword123
student1@student.edu,studentpass456
teacher2@university.edu,
student2@student.edu,custompass789
";

    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        axum::http::header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"password_template.csv\""),
    );

    (StatusCode::OK, (headers, csv.to_string()))
}
