use sea_orm::{DatabaseConnection, DbErr};
use std::future::Future;
use std::pin::Pin;

use crate::seed::Seeder;
use db::models::{branch, class, department, semester};

/// Departments, branches, all eight semesters, and classes for a couple of
/// semesters per branch.
pub struct OrgSeeder;

impl Seeder for OrgSeeder {
    fn seed<'a>(
        &'a self,
        db: &'a DatabaseConnection,
    ) -> Pin<Box<dyn Future<Output = Result<(), DbErr>> + Send + 'a>> {
        Box::pin(async move {
            let cse_dept = department::Model::create(db, "Computer Science", "CSE").await?;
            let mech_dept = department::Model::create(db, "Mechanical Engineering", "ME").await?;

            let cse = branch::Model::create(db, "Computer Science", "CSE", cse_dept.id).await?;
            let it = branch::Model::create(db, "Information Technology", "IT", cse_dept.id).await?;
            let me = branch::Model::create(db, "Mechanical", "ME", mech_dept.id).await?;

            for number in 1..=8 {
                semester::Model::create(db, number).await?;
            }

            // Classes for two teaching semesters, two divisions each.
            for number in [1, 5] {
                let sem = semester::Model::find_by_number(db, number)
                    .await?
                    .expect("semester was just seeded");
                for br in [&cse, &it, &me] {
                    for division in ["1", "2"] {
                        let name = format!("{}{}{}", number, br.code, division);
                        class::Model::create(db, &name, division, sem.id, br.id).await?;
                    }
                }
            }

            Ok(())
        })
    }
}
