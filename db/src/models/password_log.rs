use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Security audit trail for credential changes. Append-only.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "password_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Whose password changed.
    pub user_id: i64,
    /// The admin who performed the change.
    pub admin_id: i64,
    pub action: Action,
    pub method: Method,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "password_action_type")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Action {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "updated")]
    Updated,
    #[sea_orm(string_value = "reset")]
    Reset,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "password_method_type")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Method {
    #[sea_orm(string_value = "manual")]
    Manual,
    #[sea_orm(string_value = "auto_generated")]
    AutoGenerated,
    #[sea_orm(string_value = "bulk_upload")]
    BulkUpload,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        db: &DatabaseConnection,
        user_id: i64,
        admin_id: i64,
        action: Action,
        method: Method,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Self, DbErr> {
        let active = ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            admin_id: Set(admin_id),
            action: Set(action),
            method: Set(method),
            ip_address: Set(ip_address.map(str::to_owned)),
            user_agent: Set(user_agent.map(str::to_owned)),
            notes: Set(notes.map(str::to_owned)),
            created_at: Set(Utc::now()),
        };
        active.insert(db).await
    }

    pub async fn recent(db: &DatabaseConnection, limit: u64) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .order_by_desc(Column::CreatedAt)
            .paginate(db, limit)
            .fetch_page(0)
            .await
    }
}
