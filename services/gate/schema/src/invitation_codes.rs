use sea_orm::entity::prelude::*;

/// Invitation code gating registration. Codes are stored lowercase
/// (lookups normalize before hitting the table). Usable iff
/// `now < expiration_date && usage_count < max_uses`; `usage_count` only
/// ever grows. Exhausted and expired rows stay for audit.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "invitation_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub expiration_date: chrono::DateTime<chrono::Utc>,
    pub usage_count: i32,
    pub max_uses: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
