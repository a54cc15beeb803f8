use sea_orm::DatabaseConnection;

use super::next_seq;
use crate::models::user::{Model as User, Role};

pub async fn admin(db: &DatabaseConnection) -> User {
    let n = next_seq();
    User::create(
        db,
        &format!("Admin {n}"),
        &format!("admin{n}@test.edu"),
        "password",
        Role::Admin,
        None,
    )
    .await
    .expect("create admin")
}

pub async fn teacher(db: &DatabaseConnection) -> User {
    let n = next_seq();
    User::create(
        db,
        &format!("Teacher {n}"),
        &format!("teacher{n}@test.edu"),
        "password",
        Role::Teacher,
        None,
    )
    .await
    .expect("create teacher")
}

pub async fn hod(db: &DatabaseConnection, department_id: i64) -> User {
    let n = next_seq();
    User::create(
        db,
        &format!("Hod {n}"),
        &format!("hod{n}@test.edu"),
        "password",
        Role::Hod,
        Some(department_id),
    )
    .await
    .expect("create hod")
}

pub async fn principal(db: &DatabaseConnection) -> User {
    let n = next_seq();
    User::create(
        db,
        &format!("Principal {n}"),
        &format!("principal{n}@test.edu"),
        "password",
        Role::Principal,
        None,
    )
    .await
    .expect("create principal")
}

pub async fn student(db: &DatabaseConnection, class_id: i64, roll_number: &str) -> User {
    let n = next_seq();
    User::create_student(
        db,
        &format!("Student {n}"),
        &format!("student{n}@test.edu"),
        "password",
        roll_number,
        class_id,
    )
    .await
    .expect("create student")
}
