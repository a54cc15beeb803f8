use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A taught class: one division of a branch in a given semester
/// (e.g. "5CSE1" = semester 5, CSE, division 1).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique.
    pub name: String,
    pub division: String,
    pub semester_id: i64,
    pub branch_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::semester::Entity",
        from = "Column::SemesterId",
        to = "super::semester::Column::Id"
    )]
    Semester,
    #[sea_orm(
        belongs_to = "super::branch::Entity",
        from = "Column::BranchId",
        to = "super::branch::Column::Id"
    )]
    Branch,
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
}

impl Related<super::semester::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Semester.def()
    }
}

impl Related<super::branch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branch.def()
    }
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        name: &str,
        division: &str,
        semester_id: i64,
        branch_id: i64,
    ) -> Result<Self, DbErr> {
        let active = ActiveModel {
            id: NotSet,
            name: Set(name.trim().to_owned()),
            division: Set(division.trim().to_owned()),
            semester_id: Set(semester_id),
            branch_id: Set(branch_id),
        };
        active.insert(db).await
    }

    pub async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::Name.eq(name.trim()))
            .one(db)
            .await
    }

    pub async fn has_students(db: &DatabaseConnection, class_id: i64) -> Result<bool, DbErr> {
        Ok(super::user::Entity::find()
            .filter(super::user::Column::ClassId.eq(class_id))
            .filter(super::user::Column::Role.eq(super::user::Role::Student))
            .one(db)
            .await?
            .is_some())
    }
}
