use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A study branch within a department. Codes repeat across departments, so
/// uniqueness is on (code, department).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "branches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub code: String,
    pub department_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id"
    )]
    Department,
    #[sea_orm(has_many = "super::class::Entity")]
    Classes,
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        name: &str,
        code: &str,
        department_id: i64,
    ) -> Result<Self, DbErr> {
        let active = ActiveModel {
            id: NotSet,
            name: Set(name.trim().to_owned()),
            code: Set(code.trim().to_uppercase()),
            department_id: Set(department_id),
        };
        active.insert(db).await
    }

    pub async fn has_classes(db: &DatabaseConnection, branch_id: i64) -> Result<bool, DbErr> {
        Ok(super::class::Entity::find()
            .filter(super::class::Column::BranchId.eq(branch_id))
            .one(db)
            .await?
            .is_some())
    }
}
