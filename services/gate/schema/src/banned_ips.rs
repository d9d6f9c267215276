use sea_orm::entity::prelude::*;

/// Time-boxed IP ban. An IP is banned iff `now < ban_start + ban_duration`
/// (epoch seconds). Repeat violations double `ban_duration` up to a cap and
/// restart `ban_start`; rows expire by time rather than deletion.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "banned_ips")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ip_address: String,
    pub ban_start: i64,
    pub ban_duration: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_active(&self, now: i64) -> bool {
        now < self.ban_start + self.ban_duration
    }
}
