use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use db::models::{branch, class, department, semester, user};

/// Class DTO with the display fields the admin screens need resolved.
#[derive(Debug, Serialize)]
pub struct ClassResponse {
    pub id: i64,
    pub name: String,
    pub division: String,
    pub semester_number: Option<i32>,
    pub branch_name: Option<String>,
    pub department_name: Option<String>,
    pub student_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct ClassReq {
    pub name: String,
    #[serde(default)]
    pub division: String,
    pub semester_id: i64,
    pub branch_id: i64,
}

/// Resolves semester/branch/department names and per-class student counts
/// for a page of classes in four queries rather than one per row.
pub async fn to_responses(
    db: &DatabaseConnection,
    classes: Vec<class::Model>,
) -> Result<Vec<ClassResponse>, DbErr> {
    let semesters: HashMap<i64, i32> = semester::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.number))
        .collect();

    let branches: HashMap<i64, branch::Model> = branch::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();

    let departments: HashMap<i64, String> = department::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();

    let class_ids: Vec<i64> = classes.iter().map(|c| c.id).collect();
    let mut counts: HashMap<i64, i64> = HashMap::new();
    if !class_ids.is_empty() {
        let students = user::Entity::find()
            .filter(user::Column::Role.eq(user::Role::Student))
            .filter(user::Column::ClassId.is_in(class_ids))
            .all(db)
            .await?;
        for s in students {
            if let Some(cid) = s.class_id {
                *counts.entry(cid).or_insert(0) += 1;
            }
        }
    }

    Ok(classes
        .into_iter()
        .map(|c| {
            let br = branches.get(&c.branch_id);
            ClassResponse {
                semester_number: semesters.get(&c.semester_id).copied(),
                branch_name: br.map(|b| b.name.clone()),
                department_name: br.and_then(|b| departments.get(&b.department_id).cloned()),
                student_count: counts.get(&c.id).copied().unwrap_or(0),
                id: c.id,
                name: c.name,
                division: c.division,
            }
        })
        .collect())
}
