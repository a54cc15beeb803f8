use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Join table assigning teachers to the classes they take.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "teacher_classes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub teacher_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub class_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn assign(
        db: &DatabaseConnection,
        teacher_id: i64,
        class_id: i64,
    ) -> Result<Self, DbErr> {
        let active = ActiveModel {
            teacher_id: Set(teacher_id),
            class_id: Set(class_id),
        };
        active.insert(db).await
    }

    /// The ownership check gating session creation, review and lock.
    pub async fn exists(
        db: &DatabaseConnection,
        teacher_id: i64,
        class_id: i64,
    ) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id((teacher_id, class_id)).one(db).await?.is_some())
    }

    pub async fn remove(
        db: &DatabaseConnection,
        teacher_id: i64,
        class_id: i64,
    ) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id((teacher_id, class_id)).exec(db).await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn classes_of_teacher(
        db: &DatabaseConnection,
        teacher_id: i64,
    ) -> Result<Vec<super::class::Model>, DbErr> {
        let ids: Vec<i64> = Entity::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .all(db)
            .await?
            .into_iter()
            .map(|tc| tc.class_id)
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }
        super::class::Entity::find()
            .filter(super::class::Column::Id.is_in(ids))
            .all(db)
            .await
    }
}
