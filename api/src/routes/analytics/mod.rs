use axum::{Router, middleware::from_fn, routing::get};
use util::state::AppState;

use crate::auth::guards::{allow_admin, allow_hod, allow_principal};

pub mod get;

pub use get::{admin_overview, hod_overview, principal_overview};

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_overview).route_layer(from_fn(allow_admin)))
        .route("/hod", get(hod_overview).route_layer(from_fn(allow_hod)))
        .route(
            "/principal",
            get(principal_overview).route_layer(from_fn(allow_principal)),
        )
}
