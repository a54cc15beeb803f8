use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use db::models::{attendance_override, session};

/// Session DTO. `qr_payload` is what the projector screen encodes; the
/// artifact path points at the rendered SVG when rendering succeeded.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: i64,
    pub session_uuid: String,
    pub class_id: i64,
    pub teacher_id: i64,
    pub duration_seconds: i32,
    pub expiry: String,
    pub locked: bool,
    pub is_proxy: bool,
    pub proxy_teacher_name: Option<String>,
    pub created_at: String,
    pub qr_payload: String,
    pub qr_artifact: Option<String>,
    pub attended_count: i64,
}

impl SessionResponse {
    pub fn from_model(m: session::Model, qr_artifact: Option<String>, attended_count: i64) -> Self {
        Self {
            qr_payload: m.qr_payload(),
            expiry: m.expiry.to_rfc3339_opts(SecondsFormat::Secs, true),
            created_at: m
                .created_at
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            id: m.id,
            session_uuid: m.session_uuid,
            class_id: m.class_id,
            teacher_id: m.teacher_id,
            duration_seconds: m.duration_seconds,
            locked: m.locked,
            is_proxy: m.is_proxy,
            proxy_teacher_name: m.proxy_teacher_name,
            qr_artifact,
            attended_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionReq {
    pub duration_seconds: Option<i32>,
    pub is_proxy: Option<bool>,
    pub proxy_teacher_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OverrideReq {
    pub student_id: i64,
    pub action: attendance_override::Action,
    #[serde(default)]
    pub reason: String,
}

/// One student's presence for a session.
#[derive(Debug, Serialize)]
pub struct RosterEntry {
    pub student_id: i64,
    pub name: String,
    pub roll_number: Option<String>,
    pub present: bool,
    pub marked_at: Option<String>,
}
