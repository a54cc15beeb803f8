//! # Classes Routes Module
//!
//! Defines and wires up routes for the `/api/classes` endpoint group.
//!
//! ## Structure
//! - `get.rs` — list classes, class students, the caller's own classes
//! - `post.rs` — create class, assign a teacher
//! - `put.rs` — edit class
//! - `delete.rs` — delete class, remove a teacher assignment
//! - `attendance/` — nested per-class attendance routes
//!
//! Class CRUD is admin-only; the nested attendance group is guarded by
//! `require_class_owner` (assigned teacher or admin).

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
};
use util::state::AppState;

use crate::auth::guards::{allow_admin, allow_teacher, require_class_owner};

pub mod attendance;
pub mod common;
pub mod delete;
pub mod get;
pub mod post;
pub mod put;

pub use delete::{delete_class, remove_teacher};
pub use get::{list_class_students, list_classes, my_classes};
pub use post::{assign_teacher, create_class};
pub use put::edit_class;

pub fn class_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_classes).route_layer(from_fn(allow_admin)))
        .route("/", post(create_class).route_layer(from_fn(allow_admin)))
        .route("/mine", get(my_classes).route_layer(from_fn(allow_teacher)))
        .route(
            "/{class_id}",
            put(edit_class).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/{class_id}",
            delete(delete_class).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/{class_id}/students",
            get(list_class_students).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/{class_id}/teachers",
            post(assign_teacher).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/{class_id}/teachers/{teacher_id}",
            delete(remove_teacher).route_layer(from_fn(allow_admin)),
        )
        .nest(
            "/{class_id}/attendance",
            attendance::attendance_routes().route_layer(from_fn_with_state(
                app_state.clone(),
                require_class_owner,
            )),
        )
}
