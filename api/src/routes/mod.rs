//! HTTP route entry point for `/api/...`.
//!
//! Routes are organized by domain, each protected via the appropriate access
//! control middleware:
//! - `/health` → liveness check (public)
//! - `/auth` → login (public)
//! - `/departments`, `/branches`, `/semesters` → org hierarchy (admin-only)
//! - `/classes` → class management (admin) and per-class attendance (teacher)
//! - `/users` → staff and student account management (admin-only)
//! - `/passwords` → credential management and audit (admin-only)
//! - `/attendance` → QR redemption (student) and proxy issuance (teacher)
//! - `/me` → student-facing dashboard data
//! - `/analytics` → role-scoped dashboards (admin / hod / principal)
//! - `/networks` → campus network registry (teacher)

use crate::auth::guards::{allow_admin, allow_student, allow_teacher};
use axum::{Router, middleware::from_fn};
use util::state::AppState;

pub mod analytics;
pub mod attendance;
pub mod auth;
pub mod branches;
pub mod classes;
pub mod common;
pub mod departments;
pub mod health;
pub mod me;
pub mod networks;
pub mod passwords;
pub mod semesters;
pub mod users;

/// Builds the complete application router for all HTTP endpoints.
///
/// The returned router is fully stateful; `AppState` is attached here so
/// `main` and the test harness build identical applications.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health::health_routes())
        .nest("/auth", auth::auth_routes())
        .nest(
            "/departments",
            departments::department_routes().route_layer(from_fn(allow_admin)),
        )
        .nest(
            "/branches",
            branches::branch_routes().route_layer(from_fn(allow_admin)),
        )
        .nest(
            "/semesters",
            semesters::semester_routes().route_layer(from_fn(allow_admin)),
        )
        .nest("/classes", classes::class_routes(app_state.clone()))
        .nest(
            "/users",
            users::users_routes().route_layer(from_fn(allow_admin)),
        )
        .nest(
            "/passwords",
            passwords::password_routes().route_layer(from_fn(allow_admin)),
        )
        .nest("/attendance", attendance::attendance_routes())
        .nest("/me", me::me_routes().route_layer(from_fn(allow_student)))
        .nest("/analytics", analytics::analytics_routes())
        .nest(
            "/networks",
            networks::network_routes().route_layer(from_fn(allow_teacher)),
        )
        .with_state(app_state)
}
