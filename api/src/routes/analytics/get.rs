//! Role-scoped dashboard aggregates. These are read-only rollups; nothing
//! here mutates attendance state.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use chrono::SecondsFormat;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use util::state::AppState;

use crate::{auth::AuthUser, response::ApiResponse};
use db::models::{
    attendance_record, branch, class, department, semester, session, teacher_class, user,
};

#[derive(Debug, Serialize)]
pub struct RecentSession {
    pub id: i64,
    pub class_id: i64,
    pub class_name: Option<String>,
    pub created_at: String,
    pub expiry: String,
    pub locked: bool,
    pub is_proxy: bool,
    pub attended_count: i64,
}

#[derive(Debug, Serialize, Default)]
pub struct AdminOverview {
    pub departments: u64,
    pub branches: u64,
    pub semesters: u64,
    pub classes: u64,
    pub teachers: u64,
    pub students: u64,
    pub active_students: u64,
    pub alumni_students: u64,
    pub recent_sessions: Vec<RecentSession>,
}

/// GET /api/analytics/admin
///
/// System-wide counters plus the ten most recent sessions.
pub async fn admin_overview(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<AdminOverview>>) {
    let db = state.db();

    let result: Result<AdminOverview, sea_orm::DbErr> = async {
        let overview = AdminOverview {
            departments: department::Entity::find().count(db).await?,
            branches: branch::Entity::find().count(db).await?,
            semesters: semester::Entity::find().count(db).await?,
            classes: class::Entity::find().count(db).await?,
            teachers: user::Entity::find()
                .filter(user::Column::Role.eq(user::Role::Teacher))
                .count(db)
                .await?,
            students: user::Entity::find()
                .filter(user::Column::Role.eq(user::Role::Student))
                .count(db)
                .await?,
            active_students: user::Entity::find()
                .filter(user::Column::Role.eq(user::Role::Student))
                .filter(user::Column::Status.eq(user::Status::Active))
                .count(db)
                .await?,
            alumni_students: user::Entity::find()
                .filter(user::Column::Role.eq(user::Role::Student))
                .filter(user::Column::Status.eq(user::Status::Alumni))
                .count(db)
                .await?,
            recent_sessions: recent_sessions(&state, None, 10).await?,
        };
        Ok(overview)
    }
    .await;

    match result {
        Ok(overview) => (
            StatusCode::OK,
            Json(ApiResponse::success(overview, "Admin overview retrieved")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

#[derive(Debug, Serialize, Default)]
pub struct ClassAttendance {
    pub class_id: i64,
    pub name: String,
    pub sessions: u64,
    pub total_attendance: u64,
}

#[derive(Debug, Serialize, Default)]
pub struct HodOverview {
    pub department_name: String,
    pub branches: u64,
    pub classes: u64,
    pub teachers: u64,
    pub students: u64,
    pub active_students: u64,
    pub alumni_students: u64,
    pub avg_attendance: f64,
    pub class_attendance: Vec<ClassAttendance>,
    pub recent_sessions: Vec<RecentSession>,
}

/// GET /api/analytics/hod
///
/// Aggregates scoped to the calling HOD's department.
pub async fn hod_overview(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<HodOverview>>) {
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
    let Some(department_id) = me.department_id else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::error("No department assigned to HOD")),
        );
    };

    let result: Result<HodOverview, sea_orm::DbErr> = async {
        let department_name = department::Entity::find_by_id(department_id)
            .one(db)
            .await?
            .map(|d| d.name)
            .unwrap_or_default();

        let branch_ids: Vec<i64> = branch::Entity::find()
            .filter(branch::Column::DepartmentId.eq(department_id))
            .all(db)
            .await?
            .into_iter()
            .map(|b| b.id)
            .collect();

        let classes: Vec<class::Model> = if branch_ids.is_empty() {
            Vec::new()
        } else {
            class::Entity::find()
                .filter(class::Column::BranchId.is_in(branch_ids.clone()))
                .all(db)
                .await?
        };
        let class_ids: Vec<i64> = classes.iter().map(|c| c.id).collect();

        let (students, active, alumni, teachers) = if class_ids.is_empty() {
            (0, 0, 0, 0)
        } else {
            let students = user::Entity::find()
                .filter(user::Column::Role.eq(user::Role::Student))
                .filter(user::Column::ClassId.is_in(class_ids.clone()))
                .count(db)
                .await?;
            let active = user::Entity::find()
                .filter(user::Column::Role.eq(user::Role::Student))
                .filter(user::Column::Status.eq(user::Status::Active))
                .filter(user::Column::ClassId.is_in(class_ids.clone()))
                .count(db)
                .await?;
            let alumni = students - active;
            let teacher_ids: HashSet<i64> = teacher_class::Entity::find()
                .filter(teacher_class::Column::ClassId.is_in(class_ids.clone()))
                .all(db)
                .await?
                .into_iter()
                .map(|tc| tc.teacher_id)
                .collect();
            (students, active, alumni, teacher_ids.len() as u64)
        };

        // Per-class attendance totals over every session of the class.
        let mut class_attendance = Vec::with_capacity(classes.len());
        let mut session_class: HashMap<i64, i64> = HashMap::new();
        if !class_ids.is_empty() {
            let sessions = session::Entity::find()
                .filter(session::Column::ClassId.is_in(class_ids.clone()))
                .all(db)
                .await?;
            for s in &sessions {
                session_class.insert(s.id, s.class_id);
            }
            let records = if sessions.is_empty() {
                Vec::new()
            } else {
                attendance_record::Entity::find()
                    .filter(
                        attendance_record::Column::SessionId
                            .is_in(sessions.iter().map(|s| s.id).collect::<Vec<_>>()),
                    )
                    .all(db)
                    .await?
            };
            let mut per_class_attendance: HashMap<i64, u64> = HashMap::new();
            for r in &records {
                if let Some(&cid) = session_class.get(&r.session_id) {
                    *per_class_attendance.entry(cid).or_insert(0) += 1;
                }
            }
            let mut per_class_sessions: HashMap<i64, u64> = HashMap::new();
            for s in &sessions {
                *per_class_sessions.entry(s.class_id).or_insert(0) += 1;
            }
            for c in &classes {
                class_attendance.push(ClassAttendance {
                    class_id: c.id,
                    name: c.name.clone(),
                    sessions: per_class_sessions.get(&c.id).copied().unwrap_or(0),
                    total_attendance: per_class_attendance.get(&c.id).copied().unwrap_or(0),
                });
            }
        }

        let recent = recent_sessions(&state, Some(class_ids.clone()), 10).await?;
        let avg_attendance = if recent.is_empty() {
            0.0
        } else {
            let total: i64 = recent.iter().map(|s| s.attended_count).sum();
            (total as f64 / recent.len() as f64 * 10.0).round() / 10.0
        };

        Ok(HodOverview {
            department_name,
            branches: branch_ids.len() as u64,
            classes: classes.len() as u64,
            teachers,
            students,
            active_students: active,
            alumni_students: alumni,
            avg_attendance,
            class_attendance,
            recent_sessions: recent,
        })
    }
    .await;

    match result {
        Ok(overview) => (
            StatusCode::OK,
            Json(ApiResponse::success(overview, "HOD overview retrieved")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

#[derive(Debug, Serialize, Default)]
pub struct DepartmentStats {
    pub name: String,
    pub branches: u64,
    pub classes: u64,
    pub students: u64,
    pub teachers: u64,
}

#[derive(Debug, Serialize, Default)]
pub struct PrincipalOverview {
    pub departments: u64,
    pub branches: u64,
    pub semesters: u64,
    pub classes: u64,
    pub teachers: u64,
    pub students: u64,
    pub active_students: u64,
    pub alumni_students: u64,
    pub avg_attendance: f64,
    pub department_stats: Vec<DepartmentStats>,
    pub recent_sessions: Vec<RecentSession>,
}

/// GET /api/analytics/principal
///
/// Institution-wide rollup with a per-department breakdown and the twenty
/// most recent sessions.
pub async fn principal_overview(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<PrincipalOverview>>) {
    let db = state.db();

    let result: Result<PrincipalOverview, sea_orm::DbErr> = async {
        let departments = department::Entity::find().all(db).await?;
        let branches = branch::Entity::find().all(db).await?;
        let classes = class::Entity::find().all(db).await?;
        let assignments = teacher_class::Entity::find().all(db).await?;
        let students = user::Entity::find()
            .filter(user::Column::Role.eq(user::Role::Student))
            .all(db)
            .await?;

        let mut class_department: HashMap<i64, i64> = HashMap::new();
        let branch_department: HashMap<i64, i64> =
            branches.iter().map(|b| (b.id, b.department_id)).collect();
        for c in &classes {
            if let Some(&dept) = branch_department.get(&c.branch_id) {
                class_department.insert(c.id, dept);
            }
        }

        let mut department_stats: Vec<DepartmentStats> = Vec::with_capacity(departments.len());
        for dept in &departments {
            let dept_classes: Vec<i64> = classes
                .iter()
                .filter(|c| class_department.get(&c.id) == Some(&dept.id))
                .map(|c| c.id)
                .collect();
            let dept_students = students
                .iter()
                .filter(|s| s.class_id.is_some_and(|cid| dept_classes.contains(&cid)))
                .count() as u64;
            let dept_teachers: HashSet<i64> = assignments
                .iter()
                .filter(|a| dept_classes.contains(&a.class_id))
                .map(|a| a.teacher_id)
                .collect();

            department_stats.push(DepartmentStats {
                name: dept.name.clone(),
                branches: branches
                    .iter()
                    .filter(|b| b.department_id == dept.id)
                    .count() as u64,
                classes: dept_classes.len() as u64,
                students: dept_students,
                teachers: dept_teachers.len() as u64,
            });
        }

        let recent = recent_sessions(&state, None, 20).await?;
        let avg_attendance = if recent.is_empty() {
            0.0
        } else {
            let total: i64 = recent.iter().map(|s| s.attended_count).sum();
            (total as f64 / recent.len() as f64 * 10.0).round() / 10.0
        };

        let active_students = students
            .iter()
            .filter(|s| s.status == user::Status::Active)
            .count() as u64;

        Ok(PrincipalOverview {
            departments: departments.len() as u64,
            branches: branches.len() as u64,
            semesters: semester::Entity::find().count(db).await?,
            classes: classes.len() as u64,
            teachers: user::Entity::find()
                .filter(user::Column::Role.eq(user::Role::Teacher))
                .count(db)
                .await?,
            students: students.len() as u64,
            active_students,
            alumni_students: students.len() as u64 - active_students,
            avg_attendance,
            department_stats,
            recent_sessions: recent,
        })
    }
    .await;

    match result {
        Ok(overview) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                overview,
                "Principal overview retrieved",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

// ---------------------------------------------------------------------------

/// The latest sessions, optionally restricted to a set of classes, with
/// class names and attendance counts resolved.
async fn recent_sessions(
    state: &AppState,
    class_ids: Option<Vec<i64>>,
    limit: u64,
) -> Result<Vec<RecentSession>, sea_orm::DbErr> {
    let db = state.db();

    if let Some(ids) = &class_ids {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
    }

    let mut query = session::Entity::find()
        .order_by_desc(session::Column::CreatedAt)
        .order_by_desc(session::Column::Id);
    if let Some(ids) = class_ids {
        query = query.filter(session::Column::ClassId.is_in(ids));
    }
    let sessions = query.paginate(db, limit).fetch_page(0).await?;

    let class_names: HashMap<i64, String> = class::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let session_ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
    let mut counts: HashMap<i64, i64> = HashMap::new();
    if !session_ids.is_empty() {
        let records = attendance_record::Entity::find()
            .filter(attendance_record::Column::SessionId.is_in(session_ids))
            .all(db)
            .await?;
        for r in records {
            *counts.entry(r.session_id).or_insert(0) += 1;
        }
    }

    Ok(sessions
        .into_iter()
        .map(|s| RecentSession {
            id: s.id,
            class_name: class_names.get(&s.class_id).cloned(),
            class_id: s.class_id,
            created_at: s.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            expiry: s.expiry.to_rfc3339_opts(SecondsFormat::Secs, true),
            locked: s.locked,
            is_proxy: s.is_proxy,
            attended_count: counts.get(&s.id).copied().unwrap_or(0),
        })
        .collect())
}
