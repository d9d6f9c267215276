use sea_orm::entity::prelude::*;

/// Append-only audit trail. Every security-relevant decision writes exactly
/// one row; nothing in the request path updates or deletes here. `username`
/// holds the literal `"unknown"` when the actor was never identified.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "security_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_type: String,
    pub username: String,
    pub ip_address: String,
    pub details: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
