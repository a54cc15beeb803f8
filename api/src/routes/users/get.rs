use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
};
use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use std::collections::HashMap;
use util::state::AppState;

use super::common::UserResponse;
use crate::response::ApiResponse;
use crate::routes::common::csv_escape;
use db::models::{class, user};

/// GET /api/users/staff
///
/// Teachers, HODs and principals, ordered by role then name.
pub async fn list_staff(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Vec<UserResponse>>>) {
    match user::Entity::find()
        .filter(user::Column::Role.is_in([
            user::Role::Teacher,
            user::Role::Hod,
            user::Role::Principal,
        ]))
        .order_by_asc(user::Column::Role)
        .order_by_asc(user::Column::Name)
        .all(state.db())
        .await
    {
        Ok(rows) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                rows.into_iter().map(UserResponse::from).collect(),
                "Staff retrieved",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

#[derive(Debug, Deserialize)]
pub struct StudentListQuery {
    /// Restrict to one class.
    pub class_id: Option<i64>,
    /// Case-insensitive match on name, email or roll number.
    pub q: Option<String>,
}

fn student_filter(query: &StudentListQuery) -> Condition {
    let mut cond = Condition::all().add(user::Column::Role.eq(user::Role::Student));
    if let Some(class_id) = query.class_id {
        cond = cond.add(user::Column::ClassId.eq(class_id));
    }
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        cond = cond.add(
            Condition::any()
                .add(user::Column::Name.contains(q))
                .add(user::Column::Email.contains(q))
                .add(user::Column::RollNumber.contains(q)),
        );
    }
    cond
}

/// GET /api/users/students
///
/// Students ordered by class then roll number, with optional class filter
/// and free-text search.
pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<StudentListQuery>,
) -> (StatusCode, Json<ApiResponse<Vec<UserResponse>>>) {
    match user::Entity::find()
        .filter(student_filter(&query))
        .order_by_asc(user::Column::ClassId)
        .order_by_asc(user::Column::RollNumber)
        .all(state.db())
        .await
    {
        Ok(rows) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                rows.into_iter().map(UserResponse::from).collect(),
                "Students retrieved",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

/// GET /api/users/students/export
///
/// CSV export of the (optionally filtered) student list.
pub async fn export_students_csv(
    State(state): State<AppState>,
    Query(query): Query<StudentListQuery>,
) -> (StatusCode, (HeaderMap, String)) {
    let db = state.db();

    let students = match user::Entity::find()
        .filter(student_filter(&query))
        .order_by_asc(user::Column::ClassId)
        .order_by_asc(user::Column::RollNumber)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(_) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                axum::http::header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                (headers, "error".to_string()),
            );
        }
    };

    let class_names: HashMap<i64, String> = class::Entity::find()
        .all(db)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let mut csv = String::from("Name,Email,Roll Number,Class,Status,Created Date\n");
    for s in students {
        let class_name = s
            .class_id
            .and_then(|id| class_names.get(&id).cloned())
            .unwrap_or_else(|| "No Class".into());
        let row = format!(
            "{},{},{},{},{},{}\n",
            csv_escape(&s.name),
            csv_escape(&s.email),
            csv_escape(s.roll_number.as_deref().unwrap_or("N/A")),
            csv_escape(&class_name),
            s.status,
            s.created_at.format("%Y-%m-%d"),
        );
        csv.push_str(&row);
    }

    let filename = format!("students_export_{}.csv", Utc::now().format("%Y%m%d_%H%M"));
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        axum::http::header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
            .unwrap_or(HeaderValue::from_static("attachment")),
    );

    (StatusCode::OK, (headers, csv))
}

/// GET /api/users/students/import/template
///
/// Sample CSV for the bulk student import. An empty password cell means
/// "auto-generate one".
pub async fn import_template() -> (StatusCode, (HeaderMap, String)) {
    let csv = "\
name,email,roll_number,class_name,password
John Doe,john.doe@example.com,2021001,5CSE1,student123
Jane Smith,jane.smith@example.com,2021002,5CSE1,
Bob Johnson,bob.johnson@example.com,2021003,5CSE2,custompass456
Alice Brown,alice.brown@example.com,2021004,5CSE2,
";

    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        axum::http::header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"sample_students.csv\""),
    );

    (StatusCode::OK, (headers, csv.to_string()))
}
