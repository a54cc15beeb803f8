use axum::{
    Extension, Json,
    extract::{ConnectInfo, Multipart, State},
    http::{HeaderMap, StatusCode},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use util::state::AppState;

use crate::routes::users::common::ImportSummary;
use crate::routes::users::post::log_password_change;
use crate::{auth::AuthUser, response::ApiResponse};
use db::models::{
    password_log::{Action as LogAction, Method as LogMethod},
    user::{self, Model as User, Role, generate_password},
};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordType {
    Manual,
    Auto,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordReq {
    pub user_id: i64,
    pub password_type: PasswordType,
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct ResetPasswordResponse {
    pub user_id: i64,
    /// Echoed so the admin can hand the credential over; it is never stored
    /// in clear anywhere else.
    pub new_password: String,
}

/// POST /api/passwords/reset
///
/// Resets one user's password, either to a supplied value or to a fresh
/// generated one.
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<ResetPasswordReq>,
) -> (StatusCode, Json<ApiResponse<ResetPasswordResponse>>) {
    let db = state.db();

    let user = match user::Entity::find_by_id(req.user_id).one(db).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("User not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let (new_password, method) = match req.password_type {
        PasswordType::Auto => (generate_password(8), LogMethod::AutoGenerated),
        PasswordType::Manual => {
            match req.new_password.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
                Some(p) => (p.to_string(), LogMethod::Manual),
                None => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ApiResponse::error("Please enter a new password")),
                    );
                }
            }
        }
    };

    if let Err(e) = user.set_password(db, &new_password).await {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to update password: {e}"))),
        );
    }

    log_password_change(
        &state,
        user.id,
        claims.sub,
        LogAction::Reset,
        method,
        &headers,
        addr,
        "Password reset by admin",
    )
    .await;

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            ResetPasswordResponse {
                user_id: user.id,
                new_password,
            },
            format!("Password updated for {}", user.name),
        )),
    )
}

#[derive(Debug, Deserialize)]
pub struct BulkResetReq {
    pub role: Role,
    pub password_type: PasswordType,
    pub new_password: Option<String>,
}

/// POST /api/passwords/bulk-reset
///
/// Resets every account of a role. Auto mode generates a distinct password
/// per user (and therefore does not echo them back); manual mode applies the
/// one supplied password to all.
pub async fn bulk_reset_passwords(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<BulkResetReq>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = state.db();

    let manual_password = match req.password_type {
        PasswordType::Manual => {
            match req.new_password.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
                Some(p) => Some(p.to_string()),
                None => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ApiResponse::error("Please enter a new password")),
                    );
                }
            }
        }
        PasswordType::Auto => None,
    };

    let users = match user::Entity::find()
        .filter(user::Column::Role.eq(req.role))
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
    if users.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("No {}s found", req.role))),
        );
    }

    let mut updated = 0usize;
    for user in &users {
        let (password, method) = match &manual_password {
            Some(p) => (p.clone(), LogMethod::Manual),
            None => (generate_password(8), LogMethod::AutoGenerated),
        };
        if let Err(e) = user.set_password(db, &password).await {
            tracing::error!(error = %e, user_id = user.id, "Bulk password reset failed for user");
            continue;
        }
        log_password_change(
            &state,
            user.id,
            claims.sub,
            LogAction::Reset,
            method,
            &headers,
            addr,
            "Bulk password reset by admin",
        )
        .await;
        updated += 1;
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            (),
            format!("Updated passwords for {updated} {}s", req.role),
        )),
    )
}

/// POST /api/passwords/import
///
/// Bulk password update from a multipart CSV upload keyed by email.
///
/// Fields: `csv_file` (required), `password_column` (default "password"),
/// `auto_generate_missing` ("on" to generate for empty cells),
/// `default_password` (fallback for empty cells).
pub async fn import_passwords(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, Json<ApiResponse<ImportSummary>>) {
    let db = state.db();

    let mut csv_bytes: Option<Vec<u8>> = None;
    let mut password_column = "password".to_string();
    let mut auto_generate_missing = false;
    let mut default_password = String::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name() {
            Some("csv_file") => {
                csv_bytes = field.bytes().await.ok().map(|b| b.to_vec());
            }
            Some("password_column") => {
                let value = field.text().await.unwrap_or_default().trim().to_string();
                if !value.is_empty() {
                    password_column = value;
                }
            }
            Some("auto_generate_missing") => {
                auto_generate_missing = field.text().await.unwrap_or_default() == "on";
            }
            Some("default_password") => {
                default_password = field.text().await.unwrap_or_default().trim().to_string();
            }
            _ => {}
        }
    }

    let Some(bytes) = csv_bytes else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No file selected")),
        );
    };
    let Ok(content) = String::from_utf8(bytes) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("CSV file must be UTF-8 encoded")),
        );
    };

    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let header_fields: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|s| s.trim().to_string()).collect(),
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format!("Error reading CSV file: {e}"))),
            );
        }
    };
    if !header_fields.iter().any(|h| h == "email") {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Missing required columns: email")),
        );
    }
    if !header_fields.iter().any(|h| *h == password_column) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!(
                "Password column \"{password_column}\" not found in CSV"
            ))),
        );
    }

    let mut summary = ImportSummary::default();

    for result in reader.deserialize::<std::collections::HashMap<String, String>>() {
        let Ok(row) = result else {
            summary.failed += 1;
            continue;
        };
        let email = row
            .get("email")
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();
        if email.is_empty() {
            summary.failed += 1;
            continue;
        }

        let user = match User::find_by_email(db, &email).await {
            Ok(Some(u)) => u,
            _ => {
                summary.failed += 1;
                continue;
            }
        };

        let cell = row
            .get(&password_column)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let (password, method) = if !cell.is_empty() {
            (cell, LogMethod::BulkUpload)
        } else if auto_generate_missing {
            (generate_password(8), LogMethod::AutoGenerated)
        } else if !default_password.is_empty() {
            (default_password.clone(), LogMethod::BulkUpload)
        } else {
            summary.failed += 1;
            continue;
        };

        if user.set_password(db, &password).await.is_err() {
            summary.failed += 1;
            continue;
        }
        log_password_change(
            &state,
            user.id,
            claims.sub,
            LogAction::Updated,
            method,
            &headers,
            addr,
            "Bulk upload - password updated",
        )
        .await;
        summary.imported += 1;
    }

    let message = if summary.imported > 0 {
        format!(
            "Successfully updated passwords for {} users ({} failed)",
            summary.imported, summary.failed
        )
    } else {
        "No users were updated. Check your CSV format and data".to_string()
    };

    (StatusCode::OK, Json(ApiResponse::success(summary, message)))
}
