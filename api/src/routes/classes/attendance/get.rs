//! Attendance read-only routes: list sessions, latest session with roster,
//! the full records matrix, CSV export and PDF reports.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
};
use chrono::{SecondsFormat, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;
use util::state::AppState;

use super::common::{RosterEntry, SessionResponse};
use crate::response::ApiResponse;
use crate::routes::common::csv_escape;
use db::models::{
    attendance_record,
    class,
    session::{self, Model as Session},
    user,
};

/// GET /api/classes/{class_id}/attendance/sessions
///
/// All sessions for the class, newest first, each with its attendance count.
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Vec<SessionResponse>>>) {
    let db = state.db();

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

    let counts = match attendance_counts(&state, &sessions).await {
        Ok(counts) => counts,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let resp = sessions
        .into_iter()
        .map(|s| {
            let attended = counts.get(&s.id).copied().unwrap_or(0);
            SessionResponse::from_model(s, None, attended)
        })
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(resp, "Sessions retrieved")),
    )
}

#[derive(Debug, Serialize)]
pub struct LatestSessionResponse {
    pub session: SessionResponse,
    pub review_window_open: bool,
    pub review_deadline: String,
    pub roster: Vec<RosterEntry>,
}

/// GET /api/classes/{class_id}/attendance/sessions/latest
///
/// The most recent session plus the per-student present/absent roster, which
/// is what the review screen works from.
pub async fn latest_session(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Option<LatestSessionResponse>>>) {
    let db = state.db();

    let sess = match Session::latest_for_class(db, class_id).await {
        Ok(Some(sess)) => sess,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("No session found for this class")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let roster = match roster_for_session(&state, class_id, sess.id).await {
        Ok(roster) => roster,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let now = Utc::now();
    let attended = roster.iter().filter(|r| r.present).count() as i64;
    let resp = LatestSessionResponse {
        review_window_open: sess.review_window_open(now),
        review_deadline: sess
            .review_deadline()
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        session: SessionResponse::from_model(sess, None, attended),
        roster,
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(Some(resp), "Latest session retrieved")),
    )
}

#[derive(Debug, Serialize)]
pub struct SessionRecords {
    pub session: SessionResponse,
    pub present_count: i64,
    pub total_count: i64,
    pub attendance: Vec<RosterEntry>,
}

/// GET /api/classes/{class_id}/attendance/records
///
/// Every session of the class with its full roster. The history view.
pub async fn class_records(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Vec<SessionRecords>>>) {
    let db = state.db();

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

    let mut out = Vec::with_capacity(sessions.len());
    for sess in sessions {
        let roster = match roster_for_session(&state, class_id, sess.id).await {
            Ok(roster) => roster,
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(format!("Database error: {e}"))),
                );
            }
        };
        let present = roster.iter().filter(|r| r.present).count() as i64;
        let total = roster.len() as i64;
        out.push(SessionRecords {
            session: SessionResponse::from_model(sess, None, present),
            present_count: present,
            total_count: total,
            attendance: roster,
        });
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(out, "Attendance records retrieved")),
    )
}

/// GET /api/classes/{class_id}/attendance/records/export
///
/// CSV attachment: one row per student, one column per session, cells are
/// Present/Absent.
pub async fn export_records_csv(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> (StatusCode, (HeaderMap, String)) {
    let (class_name, students, sessions, present) =
        match matrix_data(&state, class_id).await {
            Ok(data) => data,
            Err(e) => {
                let mut headers = HeaderMap::new();
                headers.insert(
                    axum::http::header::CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                );
                tracing::error!(error = %e, class_id, "Failed to export attendance records");
                return (StatusCode::INTERNAL_SERVER_ERROR, (headers, "error".to_string()));
            }
        };

    let mut csv = String::from("Student Name,Roll Number,Email");
    for sess in &sessions {
        csv.push_str(&format!(
            ",Session {} ({})",
            sess.id,
            sess.created_at.format("%Y-%m-%d %H:%M")
        ));
    }
    csv.push('\n');

    for student in &students {
        csv.push_str(&csv_escape(&student.name));
        csv.push(',');
        csv.push_str(&csv_escape(student.roll_number.as_deref().unwrap_or("N/A")));
        csv.push(',');
        csv.push_str(&csv_escape(&student.email));
        for sess in &sessions {
            csv.push(',');
            csv.push_str(if present.contains(&(sess.id, student.id)) {
                "Present"
            } else {
                "Absent"
            });
        }
        csv.push('\n');
    }

    let filename = format!(
        "attendance_records_{}_{}.csv",
        class_name,
        Utc::now().format("%Y%m%d_%H%M")
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        axum::http::header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
            .unwrap_or(HeaderValue::from_static("attachment")),
    );

    (StatusCode::OK, (headers, csv))
}

/// GET /api/classes/{class_id}/attendance/sessions/{session_id}/report.pdf
///
/// Single-session report: present and absent tables plus a summary.
pub async fn session_report_pdf(
    State(state): State<AppState>,
    Path((class_id, session_id)): Path<(i64, i64)>,
) -> (StatusCode, (HeaderMap, Vec<u8>)) {
    let Some(sess) = super::post::find_class_session(&state, class_id, session_id).await else {
        return pdf_error(StatusCode::NOT_FOUND);
    };

    let class_name = class::Entity::find_by_id(class_id)
        .one(state.db())
        .await
        .ok()
        .flatten()
        .map(|c| c.name)
        .unwrap_or_default();

    let roster = match roster_for_session(&state, class_id, sess.id).await {
        Ok(roster) => roster,
        Err(_) => return pdf_error(StatusCode::INTERNAL_SERVER_ERROR),
    };

    let present: Vec<&RosterEntry> = roster.iter().filter(|r| r.present).collect();
    let absent: Vec<&RosterEntry> = roster.iter().filter(|r| !r.present).collect();

    let mut report = match util::pdf::ReportBuilder::new(&format!(
        "Attendance Report - {class_name}"
    )) {
        Ok(report) => report,
        Err(_) => return pdf_error(StatusCode::INTERNAL_SERVER_ERROR),
    };

    report.line(&format!(
        "Session Date: {}",
        sess.created_at.format("%Y-%m-%d %H:%M:%S")
    ));
    report.line(&format!("Session ID: {}", sess.session_uuid));

    let to_rows = |entries: &[&RosterEntry]| -> Vec<Vec<String>> {
        entries
            .iter()
            .map(|r| {
                vec![
                    r.roll_number.clone().unwrap_or_else(|| "N/A".into()),
                    r.name.clone(),
                ]
            })
            .collect()
    };

    if !present.is_empty() {
        report.heading("Present Students");
        report.table(&["Roll No", "Name"], &to_rows(&present), &[35.0, 110.0]);
    }
    if !absent.is_empty() {
        report.heading("Absent Students");
        report.table(&["Roll No", "Name"], &to_rows(&absent), &[35.0, 110.0]);
    }

    let total = roster.len();
    let rate = if total > 0 {
        present.len() as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    report.heading("Summary");
    report.line(&format!("Total Students: {total}"));
    report.line(&format!("Present: {}", present.len()));
    report.line(&format!("Absent: {}", absent.len()));
    report.line(&format!("Attendance Rate: {rate:.1}%"));

    let bytes = match report.finish() {
        Ok(bytes) => bytes,
        Err(_) => return pdf_error(StatusCode::INTERNAL_SERVER_ERROR),
    };

    let filename = format!(
        "attendance_{}_{}.pdf",
        class_name,
        sess.created_at.format("%Y%m%d_%H%M")
    );
    (StatusCode::OK, (pdf_headers(&filename), bytes))
}

/// GET /api/classes/{class_id}/attendance/records/report.pdf
///
/// Whole-history report: student x session matrix (P = present, A = absent)
/// plus overall statistics.
pub async fn records_report_pdf(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> (StatusCode, (HeaderMap, Vec<u8>)) {
    let (class_name, students, sessions, present) = match matrix_data(&state, class_id).await {
        Ok(data) => data,
        Err(_) => return pdf_error(StatusCode::INTERNAL_SERVER_ERROR),
    };

    let mut report = match util::pdf::ReportBuilder::new(&format!(
        "Attendance Records - {class_name}"
    )) {
        Ok(report) => report,
        Err(_) => return pdf_error(StatusCode::INTERNAL_SERVER_ERROR),
    };

    report.line(&format!("Total Students: {}", students.len()));
    report.line(&format!("Total Sessions: {}", sessions.len()));

    if !sessions.is_empty() {
        // One dated column per session; P marks presence, A absence.
        let mut headers: Vec<String> = vec!["Student".into(), "Roll No".into()];
        for sess in &sessions {
            headers.push(sess.created_at.format("%m/%d %H:%M").to_string());
        }
        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();

        let mut widths = vec![50.0, 22.0];
        widths.extend(std::iter::repeat(18.0).take(sessions.len()));

        let rows: Vec<Vec<String>> = students
            .iter()
            .map(|student| {
                let mut row = vec![
                    student.name.clone(),
                    student.roll_number.clone().unwrap_or_else(|| "N/A".into()),
                ];
                for sess in &sessions {
                    row.push(if present.contains(&(sess.id, student.id)) {
                        "P".into()
                    } else {
                        "A".into()
                    });
                }
                row
            })
            .collect();

        report.table(&header_refs, &rows, &widths);
    }

    let possible = students.len() * sessions.len();
    let actual = present.len();
    let rate = if possible > 0 {
        actual as f64 / possible as f64 * 100.0
    } else {
        0.0
    };
    report.heading("Summary");
    report.line(&format!("Total Possible Attendance: {possible}"));
    report.line(&format!("Total Actual Attendance: {actual}"));
    report.line(&format!("Overall Attendance Rate: {rate:.1}%"));

    let bytes = match report.finish() {
        Ok(bytes) => bytes,
        Err(_) => return pdf_error(StatusCode::INTERNAL_SERVER_ERROR),
    };

    let filename = format!(
        "attendance_records_{}_{}.pdf",
        class_name,
        Utc::now().format("%Y%m%d_%H%M")
    );
    (StatusCode::OK, (pdf_headers(&filename), bytes))
}

// ---------------------------------------------------------------------------
// helpers

async fn attendance_counts(
    state: &AppState,
    sessions: &[session::Model],
) -> Result<HashMap<i64, i64>, sea_orm::DbErr> {
    let ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
    let mut counts = HashMap::new();
    if ids.is_empty() {
        return Ok(counts);
    }
    let records = attendance_record::Entity::find()
        .filter(attendance_record::Column::SessionId.is_in(ids))
        .all(state.db())
        .await?;
    for r in records {
        *counts.entry(r.session_id).or_insert(0) += 1;
    }
    Ok(counts)
}

async fn roster_for_session(
    state: &AppState,
    class_id: i64,
    session_id: i64,
) -> Result<Vec<RosterEntry>, sea_orm::DbErr> {
    let db = state.db();
    let students = user::Model::students_of_class(db, class_id).await?;
    let records: HashMap<i64, chrono::DateTime<Utc>> = attendance_record::Entity::find()
        .filter(attendance_record::Column::SessionId.eq(session_id))
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.user_id, r.marked_at))
        .collect();

    Ok(students
        .into_iter()
        .map(|s| {
            let marked_at = records.get(&s.id).copied();
            RosterEntry {
                student_id: s.id,
                name: s.name,
                roll_number: s.roll_number,
                present: marked_at.is_some(),
                marked_at: marked_at.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            }
        })
        .collect())
}

type MatrixData = (
    String,
    Vec<user::Model>,
    Vec<session::Model>,
    std::collections::HashSet<(i64, i64)>,
);

/// Loads everything the matrix exports need: class name, students, sessions
/// (newest first) and the set of (session, student) presence pairs.
async fn matrix_data(state: &AppState, class_id: i64) -> Result<MatrixData, sea_orm::DbErr> {
    let db = state.db();

    let class_name = class::Entity::find_by_id(class_id)
        .one(db)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();

    let students = user::Model::students_of_class(db, class_id).await?;

    let sessions = session::Entity::find()
        .filter(session::Column::ClassId.eq(class_id))
        .order_by_desc(session::Column::CreatedAt)
        .order_by_desc(session::Column::Id)
        .all(db)
        .await?;

    let ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
    let mut present = std::collections::HashSet::new();
    if !ids.is_empty() {
        let records = attendance_record::Entity::find()
            .filter(attendance_record::Column::SessionId.is_in(ids))
            .all(db)
            .await?;
        for r in records {
            present.insert((r.session_id, r.user_id));
        }
    }

    Ok((class_name, students, sessions, present))
}

fn pdf_headers(filename: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    headers.insert(
        axum::http::header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
            .unwrap_or(HeaderValue::from_static("attachment")),
    );
    headers
}

fn pdf_error(status: StatusCode) -> (StatusCode, (HeaderMap, Vec<u8>)) {
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    (status, (headers, Vec::new()))
}
