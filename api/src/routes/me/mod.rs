use axum::{Router, routing::get};
use util::state::AppState;

pub mod get;

pub use get::{my_attendance, my_network_status};

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/attendance", get(my_attendance))
        .route("/network", get(my_network_status))
}
