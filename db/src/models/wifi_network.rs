use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;
use serde::Serialize;

/// A campus network a teacher has registered for attendance verification.
/// Scoped to its creator; only active rows participate in IP checks.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "wifi_networks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub router_ip: String,
    /// CIDR suffix ("/24") or dotted mask ("255.255.255.0"); the router's
    /// /24 is assumed when absent.
    pub subnet_mask: Option<String>,
    pub active: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Creator,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        name: &str,
        router_ip: &str,
        subnet_mask: Option<&str>,
        created_by: i64,
    ) -> Result<Self, DbErr> {
        let active = ActiveModel {
            id: NotSet,
            name: Set(name.trim().to_owned()),
            router_ip: Set(router_ip.trim().to_owned()),
            subnet_mask: Set(subnet_mask.map(|s| s.trim().to_owned())),
            active: Set(true),
            created_by: Set(created_by),
            created_at: Set(Utc::now()),
        };
        active.insert(db).await
    }

    pub async fn all_active(db: &DatabaseConnection) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::Active.eq(true))
            .all(db)
            .await
    }

    pub async fn of_creator(db: &DatabaseConnection, created_by: i64) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::CreatedBy.eq(created_by))
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await
    }

    /// Finds the first active network containing `client_ip`, if any.
    pub async fn classify(
        db: &DatabaseConnection,
        client_ip: &str,
    ) -> Result<Option<Self>, DbErr> {
        let networks = Self::all_active(db).await?;
        Ok(networks.into_iter().find(|net| {
            util::network::network_contains(&net.router_ip, net.subnet_mask.as_deref(), client_ip)
        }))
    }
}
