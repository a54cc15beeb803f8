//! Credential management under `/api/passwords` (admin-only).
//!
//! Every change appends a `password_logs` row naming the acting admin, the
//! method, and the caller's IP and user agent.

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;

pub use get::{password_overview, password_template};
pub use post::{bulk_reset_passwords, import_passwords, reset_password};

pub fn password_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(password_overview))
        .route("/template", get(password_template))
        .route("/reset", post(reset_password))
        .route("/bulk-reset", post(bulk_reset_passwords))
        .route("/import", post(import_passwords))
}
