use sea_orm::entity::prelude::*;

/// IP-scoped failed-attempt ledger. One row per (ip, second) bucket;
/// `attempt_count` is bumped with an atomic upsert so concurrent failures
/// in the same second never lose increments. `attempt_time` is epoch
/// seconds — the bucket key must compare exactly.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "login_attempts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ip_address: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub attempt_time: i64,
    pub attempt_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
