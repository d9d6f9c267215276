use sea_orm::entity::prelude::*;

/// Account-scoped failed-attempt ledger, keyed by lowercase username.
/// Same bucket shape as `login_attempts`; feeds the flat account lockout
/// (no escalating ban on this scope).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "username_login_attempts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub attempt_time: i64,
    pub attempt_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
