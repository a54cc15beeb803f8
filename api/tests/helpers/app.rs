use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response},
};
use serde_json::Value;
use util::state::AppState;

use api::routes::routes;

/// Builds the full application router over a fresh in-memory database.
///
/// The router is the same one `main` serves, so tests exercise the real
/// middleware stack and guards.
pub async fn make_test_app() -> (Router, AppState) {
    let db = db::test_utils::setup_test_db().await;
    let app_state = AppState::new(db);

    let router = Router::new().nest("/api", routes(app_state.clone()));
    (router, app_state)
}

/// Attaches a `ConnectInfo<SocketAddr>` to a request, standing in for what
/// `into_make_service_with_connect_info` provides in production.
pub fn with_connect_info(mut req: Request<Body>, ip: [u8; 4]) -> Request<Body> {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::from(ip)), 43210);
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}

/// Builds an authenticated JSON request.
pub fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    with_connect_info(req, [198, 51, 100, 7])
}

/// Builds an authenticated bodyless request.
pub fn bare_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    with_connect_info(req, [198, 51, 100, 7])
}

/// Reads a response body into JSON.
pub async fn body_json(resp: Response<axum::body::Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Reads a response body as text.
pub async fn body_text(resp: Response<axum::body::Body>) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
