use axum::{Router, middleware::from_fn, routing::post};
use util::state::AppState;

use crate::auth::guards::{allow_student, allow_teacher};

pub mod post;

pub use post::{create_proxy_session, mark_attendance};

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/mark",
            post(mark_attendance).route_layer(from_fn(allow_student)),
        )
        .route(
            "/proxy",
            post(create_proxy_session).route_layer(from_fn(allow_teacher)),
        )
}
