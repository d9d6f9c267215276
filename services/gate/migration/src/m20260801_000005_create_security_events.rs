use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SecurityEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SecurityEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SecurityEvents::EventType).string().not_null())
                    .col(ColumnDef::new(SecurityEvents::Username).string().not_null())
                    .col(ColumnDef::new(SecurityEvents::IpAddress).string().not_null())
                    .col(ColumnDef::new(SecurityEvents::Details).string().not_null())
                    .col(
                        ColumnDef::new(SecurityEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // The retention job prunes by age.
        manager
            .create_index(
                Index::create()
                    .table(SecurityEvents::Table)
                    .col(SecurityEvents::CreatedAt)
                    .name("idx_security_events_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SecurityEvents::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SecurityEvents {
    Table,
    Id,
    EventType,
    Username,
    IpAddress,
    Details,
    CreatedAt,
}
