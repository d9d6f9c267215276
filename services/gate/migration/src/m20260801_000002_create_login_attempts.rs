use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Both attempt ledgers share the (identity, second-bucket) shape.
        // The composite primary key is the upsert conflict target.
        manager
            .create_table(
                Table::create()
                    .table(LoginAttempts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LoginAttempts::IpAddress).string().not_null())
                    .col(
                        ColumnDef::new(LoginAttempts::AttemptTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoginAttempts::AttemptCount)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(LoginAttempts::IpAddress)
                            .col(LoginAttempts::AttemptTime),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(LoginAttempts::Table)
                    .col(LoginAttempts::AttemptTime)
                    .name("idx_login_attempts_attempt_time")
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UsernameLoginAttempts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UsernameLoginAttempts::Username)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UsernameLoginAttempts::AttemptTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UsernameLoginAttempts::AttemptCount)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(UsernameLoginAttempts::Username)
                            .col(UsernameLoginAttempts::AttemptTime),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(UsernameLoginAttempts::Table)
                    .col(UsernameLoginAttempts::AttemptTime)
                    .name("idx_username_login_attempts_attempt_time")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UsernameLoginAttempts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoginAttempts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum LoginAttempts {
    Table,
    IpAddress,
    AttemptTime,
    AttemptCount,
}

#[derive(Iden)]
enum UsernameLoginAttempts {
    Table,
    Username,
    AttemptTime,
    AttemptCount,
}
