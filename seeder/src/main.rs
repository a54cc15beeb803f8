use sea_orm_migration::MigratorTrait;

use crate::seed::{Seeder, run_seeder};
use crate::seeds::{accounts::AccountSeeder, classrooms::ClassroomSeeder, org::OrgSeeder};

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let db = db::connect().await;

    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    for (seeder, name) in [
        (Box::new(OrgSeeder) as Box<dyn Seeder + Send + Sync>, "Org"),
        (Box::new(AccountSeeder), "Accounts"),
        (Box::new(ClassroomSeeder), "Classrooms"),
    ] {
        run_seeder(&*seeder, name, &db).await;
    }
}
