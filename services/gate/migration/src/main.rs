use sea_orm_migration::prelude::*;

use parlor_gate_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
