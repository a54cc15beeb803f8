//! # Users Routes Module
//!
//! Account management under `/api/users`, split between staff (teachers,
//! HODs, principals) and students. Admin-only; the guard is applied where
//! the group is mounted.
//!
//! ## Structure
//! - `get.rs` — listings, CSV export, import template
//! - `post.rs` — account creation, bulk CSV import, semester promotion
//! - `put.rs` — edits
//! - `delete.rs` — deletions

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use util::state::AppState;

pub mod common;
pub mod delete;
pub mod get;
pub mod post;
pub mod put;

pub use delete::{delete_staff, delete_student};
pub use get::{export_students_csv, import_template, list_staff, list_students};
pub use post::{create_staff, create_student, import_students, promote_students};
pub use put::{edit_staff, edit_student};

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/staff", get(list_staff))
        .route("/staff", post(create_staff))
        .route("/staff/{user_id}", put(edit_staff))
        .route("/staff/{user_id}", delete(delete_staff))
        .route("/students", get(list_students))
        .route("/students", post(create_student))
        .route("/students/{user_id}", put(edit_student))
        .route("/students/{user_id}", delete(delete_student))
        .route("/students/export", get(export_students_csv))
        .route("/students/import", post(import_students))
        .route("/students/import/template", get(import_template))
        .route("/students/promote", post(promote_students))
}
