use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A top-level academic department (e.g. "Computer Science", code "CSE").
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    /// Short uppercase code, unique across departments.
    pub code: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::branch::Entity")]
    Branches,
}

impl Related<super::branch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(db: &DatabaseConnection, name: &str, code: &str) -> Result<Self, DbErr> {
        let active = ActiveModel {
            id: NotSet,
            name: Set(name.trim().to_owned()),
            code: Set(code.trim().to_uppercase()),
        };
        active.insert(db).await
    }

    pub async fn has_branches(db: &DatabaseConnection, department_id: i64) -> Result<bool, DbErr> {
        Ok(super::branch::Entity::find()
            .filter(super::branch::Column::DepartmentId.eq(department_id))
            .one(db)
            .await?
            .is_some())
    }
}
