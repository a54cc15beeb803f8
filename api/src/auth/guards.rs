use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, Path, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::{teacher_class, user::Role};
use std::collections::HashMap;
use util::state::AppState;

// --- Role Based Access Guards ---

#[derive(serde::Serialize, Default)]
pub struct Empty;

/// Helper to extract and validate the user from request extensions and insert
/// them back into the request for downstream handlers.
async fn extract_and_insert_authuser(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), (StatusCode, Json<ApiResponse<Empty>>)> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

fn forbidden(msg: &str) -> (StatusCode, Json<ApiResponse<Empty>>) {
    (StatusCode::FORBIDDEN, Json(ApiResponse::error(msg)))
}

/// Basic guard to ensure the request is authenticated.
pub async fn allow_authenticated(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, _user) = extract_and_insert_authuser(req).await?;
    Ok(next.run(req).await)
}

/// Admin-only guard.
pub async fn allow_admin(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;
    if user.0.role != Role::Admin {
        return Err(forbidden("Admin access required"));
    }
    Ok(next.run(req).await)
}

/// Teacher-only guard (admins pass as well).
pub async fn allow_teacher(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;
    if !matches!(user.0.role, Role::Teacher | Role::Admin) {
        return Err(forbidden("Teacher access required"));
    }
    Ok(next.run(req).await)
}

/// Student-only guard.
pub async fn allow_student(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;
    if user.0.role != Role::Student {
        return Err(forbidden("Only students are allowed here"));
    }
    Ok(next.run(req).await)
}

/// HOD-only guard.
pub async fn allow_hod(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;
    if user.0.role != Role::Hod {
        return Err(forbidden("HOD access required"));
    }
    Ok(next.run(req).await)
}

/// Principal-only guard.
pub async fn allow_principal(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;
    if user.0.role != Role::Principal {
        return Err(forbidden("Principal access required"));
    }
    Ok(next.run(req).await)
}

/// Ownership guard for `/classes/{class_id}/...` teacher routes.
///
/// A teacher must be assigned to the class; admins pass unconditionally.
/// This is the `NotAuthorized` check of the attendance review flow, kept at
/// the route layer so the domain core never re-implements it.
pub async fn require_class_owner(
    State(app_state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    let class_id = params
        .get("class_id")
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Missing or invalid class_id")),
        ))?;

    if user.0.role == Role::Admin {
        return Ok(next.run(req).await);
    }
    if user.0.role != Role::Teacher {
        return Err(forbidden("Teacher access required"));
    }

    match teacher_class::Model::exists(app_state.db(), user.0.sub, class_id).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err(forbidden("You don't have access to this class")),
        Err(e) => {
            // Deny on DB error (fail-safe)
            tracing::warn!(
                error = %e,
                user_id = user.0.sub, class_id,
                "DB error while checking class ownership; denying access"
            );
            Err(forbidden("You don't have access to this class"))
        }
    }
}
