use sea_orm::DatabaseConnection;

use super::next_seq;
use crate::models::{branch, class, department, semester, teacher_class, user};

/// Builds the full hierarchy (department → branch → semester → class) plus a
/// teacher assigned to the class.
pub async fn class_with_teacher(
    db: &DatabaseConnection,
) -> (class::Model, user::Model) {
    let n = next_seq();

    let dept = department::Model::create(db, &format!("Department {n}"), &format!("D{n}"))
        .await
        .expect("create department");
    let br = branch::Model::create(db, &format!("Branch {n}"), &format!("B{n}"), dept.id)
        .await
        .expect("create branch");
    let sem = match semester::Model::find_by_number(db, 5).await.expect("find semester") {
        Some(s) => s,
        None => semester::Model::create(db, 5).await.expect("create semester"),
    };
    let class = class::Model::create(db, &format!("5CSE{n}"), "1", sem.id, br.id)
        .await
        .expect("create class");

    let teacher = super::teacher(db).await;
    teacher_class::Model::assign(db, teacher.id, class.id)
        .await
        .expect("assign teacher");

    (class, teacher)
}

/// A class one semester ahead of `class`, same branch and division, for
/// promotion tests.
pub async fn next_semester_class(
    db: &DatabaseConnection,
    class: &class::Model,
    current_number: i32,
) -> class::Model {
    let n = next_seq();
    let sem = match semester::Model::find_by_number(db, current_number + 1)
        .await
        .expect("find semester")
    {
        Some(s) => s,
        None => semester::Model::create(db, current_number + 1)
            .await
            .expect("create semester"),
    };
    class::Model::create(db, &format!("{}CSE{n}", current_number + 1), &class.division, sem.id, class.branch_id)
        .await
        .expect("create class")
}
