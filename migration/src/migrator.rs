use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202602010001_create_departments::Migration),
            Box::new(migrations::m202602010002_create_branches::Migration),
            Box::new(migrations::m202602010003_create_semesters::Migration),
            Box::new(migrations::m202602010004_create_classes::Migration),
            Box::new(migrations::m202602010005_create_users::Migration),
            Box::new(migrations::m202602010006_create_teacher_classes::Migration),
            Box::new(migrations::m202602080001_create_attendance::Migration),
            Box::new(migrations::m202602080002_create_attendance_overrides::Migration),
            Box::new(migrations::m202602150001_create_password_logs::Migration),
            Box::new(migrations::m202602200001_create_wifi_networks::Migration),
        ]
    }
}
