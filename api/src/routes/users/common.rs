use serde::{Deserialize, Serialize};
use validator::Validate;

use db::models::user::{self, Role, Status};

/// Account DTO without the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub roll_number: Option<String>,
    pub class_id: Option<i64>,
    pub status: String,
    pub department_id: Option<i64>,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            role: m.role.to_string(),
            roll_number: m.roll_number,
            class_id: m.class_id,
            status: m.status.to_string(),
            department_id: m.department_id,
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStaffReq {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Role,
    /// Required when role is hod.
    pub department_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditStaffReq {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    /// When present, resets the password (and is audited).
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentReq {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Roll number is required"))]
    pub roll_number: String,
    pub class_id: i64,
    /// Defaults to an auto-generated password when omitted.
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditStudentReq {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Roll number is required"))]
    pub roll_number: String,
    pub class_id: i64,
    pub status: Option<Status>,
    pub password: Option<String>,
}

/// Per-row results of a bulk CSV import. Only the first few row errors are
/// echoed back; the counts always cover the whole file.
#[derive(Debug, Serialize, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct PromotionSummary {
    pub total_students: usize,
    pub promoted: usize,
    pub moved_to_alumni: usize,
    pub errors: Vec<String>,
}
