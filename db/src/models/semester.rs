use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One of the eight numbered semesters of the programme.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "semesters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 1..=8, unique.
    pub number: i32,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::class::Entity")]
    Classes,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Students completing this semester graduate to alumni instead of
/// advancing to a ninth.
pub const FINAL_SEMESTER: i32 = 8;

impl Model {
    pub async fn create(db: &DatabaseConnection, number: i32) -> Result<Self, DbErr> {
        let active = ActiveModel {
            id: NotSet,
            number: Set(number),
            active: Set(true),
        };
        active.insert(db).await
    }

    pub async fn find_by_number(
        db: &DatabaseConnection,
        number: i32,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find().filter(Column::Number.eq(number)).one(db).await
    }
}
