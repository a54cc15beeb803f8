use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use std::future::Future;
use std::pin::Pin;

use crate::seed::Seeder;
use db::models::{department, user};

/// The fixed operator accounts: one admin, one principal, one HOD per
/// department. All use the development password "changeme".
pub struct AccountSeeder;

impl Seeder for AccountSeeder {
    fn seed<'a>(
        &'a self,
        db: &'a DatabaseConnection,
    ) -> Pin<Box<dyn Future<Output = Result<(), DbErr>> + Send + 'a>> {
        Box::pin(async move {
            user::Model::create(
                db,
                "System Admin",
                "admin@campus.edu",
                "changeme",
                user::Role::Admin,
                None,
            )
            .await?;

            user::Model::create(
                db,
                "The Principal",
                "principal@campus.edu",
                "changeme",
                user::Role::Principal,
                None,
            )
            .await?;

            let departments = department::Entity::find().all(db).await?;
            for dept in departments {
                user::Model::create(
                    db,
                    &format!("HOD {}", dept.name),
                    &format!("hod.{}@campus.edu", dept.code.to_lowercase()),
                    "changeme",
                    user::Role::Hod,
                    Some(dept.id),
                )
                .await?;
            }

            Ok(())
        })
    }
}
