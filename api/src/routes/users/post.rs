use axum::{
    Extension, Json,
    extract::{ConnectInfo, Multipart, State},
    http::{HeaderMap, StatusCode},
};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, TransactionTrait};
use std::collections::HashMap;
use std::net::SocketAddr;
use util::state::AppState;
use validator::Validate;

use super::common::{CreateStaffReq, CreateStudentReq, ImportSummary, PromotionSummary, UserResponse};
use crate::routes::common::client_ip;
use crate::{auth::AuthUser, response::ApiResponse};
use db::models::{
    class,
    password_log::{self, Action as LogAction, Method as LogMethod},
    semester,
    user::{self, Model as User, Role, Status, generate_password},
};

/// Writes a password audit row; failures are logged, not surfaced, so an
/// audit hiccup never rolls back the account change itself.
pub(crate) async fn log_password_change(
    state: &AppState,
    user_id: i64,
    admin_id: i64,
    action: LogAction,
    method: LogMethod,
    headers: &HeaderMap,
    addr: SocketAddr,
    notes: &str,
) {
    let ip = client_ip(headers, addr);
    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok());

    if let Err(e) = password_log::Model::record(
        state.db(),
        user_id,
        admin_id,
        action,
        method,
        Some(&ip),
        user_agent,
        Some(notes),
    )
    .await
    {
        tracing::error!(error = %e, user_id, "Failed to log password change");
    }
}

/// POST /api/users/staff
///
/// Creates a teacher, HOD or principal account. HODs must name the
/// department they head.
pub async fn create_staff(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<CreateStaffReq>,
) -> (StatusCode, Json<ApiResponse<Option<UserResponse>>>) {
    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Validation failed: {e}"))),
        );
    }
    if !matches!(req.role, Role::Teacher | Role::Hod | Role::Principal) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Role must be teacher, hod or principal")),
        );
    }
    if req.role == Role::Hod && req.department_id.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("A HOD requires a department")),
        );
    }
    let db = state.db();

    match User::find_by_email(db, &req.email).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error("User with this email already exists")),
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

    let department_id = if req.role == Role::Hod {
        req.department_id
    } else {
        None
    };

    match User::create(db, &req.name, &req.email, &req.password, req.role, department_id).await {
        Ok(created) => {
            log_password_change(
                &state,
                created.id,
                claims.sub,
                LogAction::Created,
                LogMethod::Manual,
                &headers,
                addr,
                &format!("{} account created by admin", created.role),
            )
            .await;
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    Some(created.into()),
                    "Staff account created",
                )),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to create account: {e}"))),
        ),
    }
}

/// POST /api/users/students
///
/// Creates a student. Email is globally unique; roll numbers are unique per
/// class. An omitted password is auto-generated and echoed in the message so
/// the admin can hand it over.
pub async fn create_student(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<CreateStudentReq>,
) -> (StatusCode, Json<ApiResponse<Option<UserResponse>>>) {
    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Validation failed: {e}"))),
        );
    }
    let db = state.db();

    if class::Entity::find_by_id(req.class_id)
        .one(db)
        .await
        .ok()
        .flatten()
        .is_none()
    {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Class not found")),
        );
    }

    match User::find_by_email(db, &req.email).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error("Student with this email already exists")),
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

    match User::roll_number_taken(db, &req.roll_number, req.class_id).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error(
                    "Student with this roll number already exists in this class",
                )),
            );
        }
        Ok(false) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    }

    let (password, method) = match req.password.as_deref().filter(|p| !p.is_empty()) {
        Some(p) => (p.to_string(), LogMethod::Manual),
        None => (generate_password(8), LogMethod::AutoGenerated),
    };

    match User::create_student(db, &req.name, &req.email, &password, &req.roll_number, req.class_id)
        .await
    {
        Ok(created) => {
            log_password_change(
                &state,
                created.id,
                claims.sub,
                LogAction::Created,
                method,
                &headers,
                addr,
                "Student account created by admin",
            )
            .await;

            let message = match method {
                LogMethod::AutoGenerated => {
                    format!("Student created. Generated password: {password}")
                }
                _ => "Student created".to_string(),
            };
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(Some(created.into()), message)),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to create student: {e}"))),
        ),
    }
}

/// POST /api/users/students/import
///
/// Bulk student import from a multipart CSV upload.
///
/// Required columns: `name,email,roll_number,class_name`; a `password`
/// column is optional (empty cells fall back to the `default_password`
/// field, then to auto-generation). Rows failing validation are skipped and
/// reported; the rest import.
pub async fn import_students(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, Json<ApiResponse<ImportSummary>>) {
    let db = state.db();

    let mut csv_bytes: Option<Vec<u8>> = None;
    let mut default_password = String::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name() {
            Some("csv_file") => {
                csv_bytes = field.bytes().await.ok().map(|b| b.to_vec());
            }
            Some("default_password") => {
                default_password = field.text().await.unwrap_or_default().trim().to_string();
            }
            _ => {}
        }
    }

    let Some(bytes) = csv_bytes else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No file selected")),
        );
    };

    let Ok(content) = String::from_utf8(bytes) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("CSV file must be UTF-8 encoded")),
        );
    };
    if content.contains('\t') {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                "CSV file contains tab characters. Please use commas to separate columns",
            )),
        );
    }

    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let header_fields: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|s| s.trim().to_string()).collect(),
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format!("Error reading CSV file: {e}"))),
            );
        }
    };

    let required = ["name", "email", "roll_number", "class_name"];
    let missing: Vec<&str> = required
        .iter()
        .filter(|c| !header_fields.iter().any(|h| h == *c))
        .copied()
        .collect();
    if !missing.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!(
                "Missing required columns: {}",
                missing.join(", ")
            ))),
        );
    }

    // Class names resolve once up front; unknown classes fail their rows.
    let classes: HashMap<String, i64> = match class::Entity::find().all(db).await {
        Ok(rows) => rows.into_iter().map(|c| (c.name, c.id)).collect(),
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let mut summary = ImportSummary::default();

    for (idx, record) in reader.deserialize::<HashMap<String, String>>().enumerate() {
        let row_num = idx + 2; // header is row 1
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                summary.errors.push(format!("Row {row_num}: {e}"));
                summary.failed += 1;
                continue;
            }
        };

        let get = |key: &str| row.get(key).map(|s| s.trim().to_string()).unwrap_or_default();
        let name = get("name");
        let email = get("email").to_lowercase();
        let roll_number = get("roll_number");
        let class_name = get("class_name");

        if name.is_empty() || email.is_empty() || roll_number.is_empty() || class_name.is_empty() {
            summary.errors.push(format!("Row {row_num}: Missing required fields"));
            summary.failed += 1;
            continue;
        }
        if !email.contains('@') || !email.split('@').next_back().is_some_and(|d| d.contains('.')) {
            summary
                .errors
                .push(format!("Row {row_num}: Invalid email format - {email}"));
            summary.failed += 1;
            continue;
        }
        let Some(&class_id) = classes.get(&class_name) else {
            summary
                .errors
                .push(format!("Row {row_num}: Class '{class_name}' does not exist"));
            summary.failed += 1;
            continue;
        };

        match User::find_by_email(db, &email).await {
            Ok(Some(_)) => {
                summary
                    .errors
                    .push(format!("Row {row_num}: Email '{email}' already exists"));
                summary.failed += 1;
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                summary.errors.push(format!("Row {row_num}: {e}"));
                summary.failed += 1;
                continue;
            }
        }
        match User::roll_number_taken(db, &roll_number, class_id).await {
            Ok(true) => {
                summary.errors.push(format!(
                    "Row {row_num}: Roll number '{roll_number}' already exists in class '{class_name}'"
                ));
                summary.failed += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                summary.errors.push(format!("Row {row_num}: {e}"));
                summary.failed += 1;
                continue;
            }
        }

        let csv_password = get("password");
        let (password, method) = if !csv_password.is_empty() {
            (csv_password, LogMethod::BulkUpload)
        } else if !default_password.is_empty() {
            (default_password.clone(), LogMethod::BulkUpload)
        } else {
            (generate_password(8), LogMethod::AutoGenerated)
        };

        match User::create_student(db, &name, &email, &password, &roll_number, class_id).await {
            Ok(created) => {
                log_password_change(
                    &state,
                    created.id,
                    claims.sub,
                    LogAction::Created,
                    method,
                    &headers,
                    addr,
                    "Bulk upload - student account created",
                )
                .await;
                summary.imported += 1;
            }
            Err(e) => {
                summary.errors.push(format!("Row {row_num}: {e}"));
                summary.failed += 1;
            }
        }
    }

    // Echo at most the first five row errors, like the counts summary line.
    summary.errors.truncate(5);

    let message = if summary.imported > 0 {
        format!(
            "Successfully imported {} students ({} failed)",
            summary.imported, summary.failed
        )
    } else {
        "No students were imported. Check your CSV format and data".to_string()
    };

    (StatusCode::OK, Json(ApiResponse::success(summary, message)))
}

/// POST /api/users/students/promote
///
/// Promotes every active student one semester forward (same branch and
/// division); final-semester students graduate to alumni. Rows that cannot
/// be promoted (missing class, missing target class) are reported without
/// aborting the rest.
pub async fn promote_students(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<PromotionSummary>>) {
    let db = state.db();

    let students = match user::Entity::find()
        .filter(user::Column::Role.eq(Role::Student))
        .filter(user::Column::Status.eq(Status::Active))
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

    let classes: HashMap<i64, class::Model> = match class::Entity::find().all(db).await {
        Ok(rows) => rows.into_iter().map(|c| (c.id, c)).collect(),
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };
    let semesters: HashMap<i64, i32> = match semester::Entity::find().all(db).await {
        Ok(rows) => rows.into_iter().map(|s| (s.id, s.number)).collect(),
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    // Resolve every promotion target up front so the transaction below only
    // carries the updates.
    let semester_by_number: HashMap<i32, i64> =
        semesters.iter().map(|(&id, &number)| (number, id)).collect();
    let find_target = |current: &class::Model, next_semester_id: i64| {
        classes.values().find(|c| {
            c.semester_id == next_semester_id
                && c.branch_id == current.branch_id
                && c.division == current.division
        })
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let mut summary = PromotionSummary {
        total_students: students.len(),
        ..Default::default()
    };

    for student in students {
        let Some(current_class) = student.class_id.and_then(|id| classes.get(&id)) else {
            summary
                .errors
                .push(format!("Student {} has no class assigned", student.name));
            continue;
        };
        let Some(&current_number) = semesters.get(&current_class.semester_id) else {
            summary
                .errors
                .push(format!("Student {} has no semester assigned", student.name));
            continue;
        };

        if current_number >= semester::FINAL_SEMESTER {
            let mut active = student.into_active_model();
            active.status = Set(Status::Alumni);
            active.class_id = Set(None);
            if let Err(e) = active.update(&txn).await {
                summary.errors.push(format!("Failed to update student: {e}"));
                continue;
            }
            summary.moved_to_alumni += 1;
            continue;
        }

        let Some(&next_semester_id) = semester_by_number.get(&(current_number + 1)) else {
            summary
                .errors
                .push(format!("Next semester {} not found", current_number + 1));
            continue;
        };
        let Some(target) = find_target(current_class, next_semester_id) else {
            summary
                .errors
                .push(format!("Next class not found for {}", current_class.name));
            continue;
        };
        let target_id = target.id;

        let mut active = student.into_active_model();
        active.class_id = Set(Some(target_id));
        if let Err(e) = active.update(&txn).await {
            summary.errors.push(format!("Failed to update student: {e}"));
            continue;
        }
        summary.promoted += 1;
    }

    if let Err(e) = txn.commit().await {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Promotion failed: {e}"))),
        );
    }

    let message = format!(
        "Promotion completed! {} students promoted, {} moved to alumni",
        summary.promoted, summary.moved_to_alumni
    );
    (StatusCode::OK, Json(ApiResponse::success(summary, message)))
}
