use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Payments::OrderId).uuid().null())
                    .col(ColumnDef::new(Payments::UserId).uuid().not_null())
                    .col(ColumnDef::new(Payments::Amount).decimal_len(10, 2).not_null())
                    .col(
                        ColumnDef::new(Payments::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Payments::Method)
                            .string_len(20)
                            .not_null()
                            .default("cash"),
                    )
                    .col(
                        ColumnDef::new(Payments::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Signed balance ledger: one row per balance mutation
        manager
            .create_table(
                Table::create()
                    .table(BalanceTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BalanceTransactions::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BalanceTransactions::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(BalanceTransactions::Amount)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BalanceTransactions::Kind)
                            .string_len(20)
                            .not_null()
                            .default("payment"),
                    )
                    .col(
                        ColumnDef::new(BalanceTransactions::BalanceAfter)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BalanceTransactions::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(BalanceTransactions::OrderId).uuid().null())
                    .col(
                        ColumnDef::new(BalanceTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BalanceTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Payments {
    Table,
    Id,
    OrderId,
    UserId,
    Amount,
    Status,
    Method,
    Description,
    CreatedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
pub enum BalanceTransactions {
    Table,
    Id,
    UserId,
    Amount,
    Kind,
    BalanceAfter,
    Description,
    OrderId,
    CreatedAt,
}
