use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BannedIps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BannedIps::IpAddress)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BannedIps::BanStart).big_integer().not_null())
                    .col(
                        ColumnDef::new(BannedIps::BanDuration)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BannedIps::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BannedIps {
    Table,
    IpAddress,
    BanStart,
    BanDuration,
}
