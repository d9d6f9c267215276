use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InvitationCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InvitationCodes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InvitationCodes::Code)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(InvitationCodes::ExpirationDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvitationCodes::UsageCount)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InvitationCodes::MaxUses).integer().not_null())
                    .col(
                        ColumnDef::new(InvitationCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InvitationCodes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum InvitationCodes {
    Table,
    Id,
    Code,
    ExpirationDate,
    UsageCount,
    MaxUses,
    CreatedAt,
}
