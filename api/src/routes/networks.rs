//! Campus network registry (teacher-scoped) used for attendance
//! verification. Each teacher manages their own rows; the active set is what
//! `/api/me/network` classifies students against.

use axum::{
    Extension, Json, Router,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel};
use serde::Deserialize;
use std::net::IpAddr;
use std::str::FromStr;
use util::state::AppState;

use crate::routes::common::client_ip;
use crate::{auth::AuthUser, response::ApiResponse};
use db::models::wifi_network::{self, Model as WifiNetwork};
use sea_orm::{ColumnTrait, QueryFilter};
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
pub struct CreateNetworkReq {
    pub name: String,
    pub router_ip: String,
    pub subnet_mask: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditNetworkReq {
    pub active: bool,
}

/// GET /api/networks — the caller's registered networks, newest first.
pub async fn list_networks(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<WifiNetwork>>>) {
    match WifiNetwork::of_creator(state.db(), claims.sub).await {
        Ok(rows) => (
            StatusCode::OK,
            Json(ApiResponse::success(rows, "Networks retrieved")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

/// POST /api/networks
///
/// Registers a network. The router IP must parse; the mask may be a CIDR
/// suffix or dotted form; one row per router IP.
pub async fn create_network(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<CreateNetworkReq>,
) -> (StatusCode, Json<ApiResponse<Option<WifiNetwork>>>) {
    let db = state.db();

    let name = req.name.trim();
    let router_ip = req.router_ip.trim();
    if name.is_empty() || router_ip.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Name and router IP are required")),
        );
    }
    if IpAddr::from_str(router_ip).is_err() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Invalid router IP address format")),
        );
    }
    let subnet_mask = req.subnet_mask.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if let Some(mask) = subnet_mask {
        // The router must sit inside the network its own mask describes.
        if !util::network::network_contains(router_ip, Some(mask), router_ip) {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error("Invalid subnet mask format")),
            );
        }
    }

    let duplicate = wifi_network::Entity::find()
        .filter(wifi_network::Column::RouterIp.eq(router_ip))
        .one(db)
        .await;
    match duplicate {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error(
                    "A network with this router IP already exists",
                )),
            );
        }
        Ok(None) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    }

    match WifiNetwork::create(db, name, router_ip, subnet_mask, claims.sub).await {
        Ok(row) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(Some(row), "Network added")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to add network: {e}"))),
        ),
    }
}

/// PUT /api/networks/{network_id} — toggle the active flag. Creator-scoped.
pub async fn edit_network(
    State(state): State<AppState>,
    Path(network_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<EditNetworkReq>,
) -> (StatusCode, Json<ApiResponse<Option<WifiNetwork>>>) {
    let db = state.db();

    let existing = match wifi_network::Entity::find_by_id(network_id).one(db).await {
        Ok(Some(n)) if n.created_by == claims.sub => n,
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Network not found or access denied")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let mut active = existing.into_active_model();
    active.active = Set(req.active);

    match active.update(db).await {
        Ok(row) => {
            let status = if row.active { "activated" } else { "deactivated" };
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    Some(row),
                    format!("Network {status}"),
                )),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to update network: {e}"))),
        ),
    }
}

/// DELETE /api/networks/{network_id} — creator-scoped.
pub async fn delete_network(
    State(state): State<AppState>,
    Path(network_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = state.db();

    match wifi_network::Entity::find_by_id(network_id).one(db).await {
        Ok(Some(n)) if n.created_by == claims.sub => {}
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Network not found or access denied")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    }

    match wifi_network::Entity::delete_by_id(network_id).exec(db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Network deleted")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to delete network: {e}"))),
        ),
    }
}

/// POST /api/networks/check
///
/// Classifies the caller's own IP against the configured networks — the
/// "am I on the right WiFi" test teachers run before class.
pub async fn check_network(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> (StatusCode, Json<ApiResponse<Option<WifiNetwork>>>) {
    let ip = client_ip(&headers, addr);

    match WifiNetwork::classify(state.db(), &ip).await {
        Ok(Some(net)) => {
            let message = format!("Connected to WiFi: {} (Router: {})", net.name, net.router_ip);
            (
                StatusCode::OK,
                Json(ApiResponse::success(Some(net), message)),
            )
        }
        Ok(None) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                None,
                format!("Not connected to any configured network. Your IP: {ip}"),
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

pub fn network_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_networks))
        .route("/", post(create_network))
        .route("/check", post(check_network))
        .route("/{network_id}", put(edit_network))
        .route("/{network_id}", delete(delete_network))
}
