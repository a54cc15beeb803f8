use axum::{
    Extension, Json,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
};
use chrono::SecondsFormat;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use util::state::AppState;

use crate::routes::common::client_ip;
use crate::{auth::AuthUser, response::ApiResponse};
use db::models::{attendance_record, session, user, wifi_network};

#[derive(Debug, Serialize)]
pub struct RecentAttendance {
    pub session_id: i64,
    pub created_at: String,
    pub is_proxy: bool,
    pub proxy_teacher_name: Option<String>,
    pub present: bool,
    pub marked_at: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct MyAttendance {
    pub total_sessions: i64,
    pub attended_sessions: i64,
    pub attendance_percentage: f64,
    pub recent: Vec<RecentAttendance>,
}

/// GET /api/me/attendance
///
/// The student dashboard: overall percentage plus the last ten sessions of
/// the student's class. Students without a class see zeros.
pub async fn my_attendance(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<MyAttendance>>) {
    let db = state.db();

    let me = match user::Entity::find_by_id(claims.sub).one(db).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("User not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let Some(class_id) = me.class_id else {
        return (
            StatusCode::OK,
            Json(ApiResponse::success(
                MyAttendance::default(),
                "Attendance summary retrieved",
            )),
        );
    };

    let sessions = match session::Entity::find()
        .filter(session::Column::ClassId.eq(class_id))
        .order_by_desc(session::Column::CreatedAt)
        .order_by_desc(session::Column::Id)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let session_ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
    let mut my_records: HashMap<i64, chrono::DateTime<chrono::Utc>> = HashMap::new();
    if !session_ids.is_empty() {
        match attendance_record::Entity::find()
            .filter(attendance_record::Column::UserId.eq(me.id))
            .filter(attendance_record::Column::SessionId.is_in(session_ids))
            .all(db)
            .await
        {
            Ok(rows) => {
                for r in rows {
                    my_records.insert(r.session_id, r.marked_at);
                }
            }
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(format!("Database error: {e}"))),
                );
            }
        }
    }

    let total = sessions.len() as i64;
    let attended = my_records.len() as i64;
    let percentage = if total > 0 {
        (attended as f64 / total as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    let recent = sessions
        .into_iter()
        .take(10)
        .map(|s| {
            let marked_at = my_records.get(&s.id).copied();
            RecentAttendance {
                session_id: s.id,
                created_at: s
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                is_proxy: s.is_proxy,
                proxy_teacher_name: s.proxy_teacher_name,
                present: marked_at.is_some(),
                marked_at: marked_at.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            }
        })
        .collect();

    let resp = MyAttendance {
        total_sessions: total,
        attended_sessions: attended,
        attendance_percentage: percentage,
        recent,
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(resp, "Attendance summary retrieved")),
    )
}

#[derive(Debug, Serialize, Default)]
pub struct NetworkStatus {
    pub on_campus: bool,
    pub network_name: Option<String>,
    pub client_ip: String,
}

/// GET /api/me/network
///
/// Whether the student's current IP is on a configured campus network, or
/// failing that inside the globally allowed CIDR ranges.
pub async fn my_network_status(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> (StatusCode, Json<ApiResponse<NetworkStatus>>) {
    let ip = client_ip(&headers, addr);

    match wifi_network::Model::classify(state.db(), &ip).await {
        Ok(Some(net)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                NetworkStatus {
                    on_campus: true,
                    network_name: Some(net.name.clone()),
                    client_ip: ip,
                },
                format!("Connected to campus WiFi: {}", net.name),
            )),
        ),
        Ok(None) => {
            let cidrs = util::network::parse_cidrs(&util::config::campus_allowed_cidrs());
            let on_campus = util::network::ip_in_any(&ip, &cidrs);
            let message = if on_campus {
                "Connected to an allowed campus network".to_string()
            } else {
                format!("Not connected to campus WiFi. Your IP: {ip}")
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    NetworkStatus {
                        on_campus,
                        network_name: None,
                        client_ip: ip,
                    },
                    message,
                )),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}
