use fake::Fake;
use fake::faker::name::en::Name;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use std::future::Future;
use std::pin::Pin;

use crate::seed::Seeder;
use db::models::{class, teacher_class, user};

const STUDENTS_PER_CLASS: usize = 12;

/// One teacher and a dozen students per seeded class.
pub struct ClassroomSeeder;

impl Seeder for ClassroomSeeder {
    fn seed<'a>(
        &'a self,
        db: &'a DatabaseConnection,
    ) -> Pin<Box<dyn Future<Output = Result<(), DbErr>> + Send + 'a>> {
        Box::pin(async move {
            let classes = class::Entity::find().all(db).await?;

            for (idx, class) in classes.iter().enumerate() {
                let teacher_name: String = Name().fake();
                let teacher = user::Model::create(
                    db,
                    &teacher_name,
                    &format!("teacher{}@campus.edu", idx + 1),
                    "changeme",
                    user::Role::Teacher,
                    None,
                )
                .await?;
                teacher_class::Model::assign(db, teacher.id, class.id).await?;

                for n in 1..=STUDENTS_PER_CLASS {
                    let student_name: String = Name().fake();
                    let roll = format!("{}{:03}", 2020 + idx, n);
                    user::Model::create_student(
                        db,
                        &student_name,
                        &format!("student.{}.{}@student.edu", class.name.to_lowercase(), n),
                        "changeme",
                        &roll,
                        class.id,
                    )
                    .await?;
                }
            }

            Ok(())
        })
    }
}
