use sea_orm_migration::prelude::*;

mod m20260801_000001_create_users;
mod m20260801_000002_create_login_attempts;
mod m20260801_000003_create_banned_ips;
mod m20260801_000004_create_invitation_codes;
mod m20260801_000005_create_security_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_users::Migration),
            Box::new(m20260801_000002_create_login_attempts::Migration),
            Box::new(m20260801_000003_create_banned_ips::Migration),
            Box::new(m20260801_000004_create_invitation_codes::Migration),
            Box::new(m20260801_000005_create_security_events::Migration),
        ]
    }
}
