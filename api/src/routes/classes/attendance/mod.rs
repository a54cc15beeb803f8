//! Per-class attendance routes, nested under `/api/classes/{class_id}/attendance`.
//!
//! The whole group is guarded by `require_class_owner` at the nest site:
//! only a teacher assigned to the class (or an admin) gets this far, which is
//! the `NotAuthorized` precondition of the review flow.

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod common;
pub mod get;
pub mod post;

pub use get::{class_records, export_records_csv, latest_session, list_sessions, records_report_pdf, session_report_pdf};
pub use post::{apply_override, create_session, lock_session};

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions", post(create_session))
        .route("/sessions/latest", get(latest_session))
        .route("/sessions/{session_id}/lock", post(lock_session))
        .route("/sessions/{session_id}/overrides", post(apply_override))
        .route("/sessions/{session_id}/report.pdf", get(session_report_pdf))
        .route("/records", get(class_records))
        .route("/records/export", get(export_records_csv))
        .route("/records/report.pdf", get(records_report_pdf))
}
