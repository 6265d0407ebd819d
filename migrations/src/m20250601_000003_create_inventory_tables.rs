use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IngredientStocks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IngredientStocks::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IngredientStocks::IngredientId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(IngredientStocks::CurrentQuantity)
                            .decimal_len(10, 2)
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(IngredientStocks::MinQuantity)
                            .decimal_len(10, 2)
                            .not_null()
                            .default(10.0),
                    )
                    .col(ColumnDef::new(IngredientStocks::Unit).string_len(20).not_null())
                    .col(
                        ColumnDef::new(IngredientStocks::LastRestocked)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IngredientCosts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IngredientCosts::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IngredientCosts::IngredientId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(IngredientCosts::CostPerUnit)
                            .decimal_len(10, 2)
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(IngredientCosts::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Append-only ledger of every stock movement
        manager
            .create_table(
                Table::create()
                    .table(StockHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockHistory::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockHistory::IngredientId).uuid().not_null())
                    .col(
                        ColumnDef::new(StockHistory::Operation)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockHistory::QuantityChange)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockHistory::QuantityBefore)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockHistory::QuantityAfter)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockHistory::TotalCost)
                            .decimal_len(10, 2)
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(StockHistory::PerformedBy).uuid().null())
                    .col(
                        ColumnDef::new(StockHistory::Notes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(StockHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PreparedDishes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PreparedDishes::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PreparedDishes::DishId).uuid().not_null())
                    .col(
                        ColumnDef::new(PreparedDishes::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PreparedDishes::MaxQuantity)
                            .integer()
                            .not_null()
                            .default(20),
                    )
                    .col(
                        ColumnDef::new(PreparedDishes::PreparedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PreparedDishes::PreparedBy).uuid().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PreparedDishes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StockHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(IngredientCosts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(IngredientStocks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum IngredientStocks {
    Table,
    Id,
    IngredientId,
    CurrentQuantity,
    MinQuantity,
    Unit,
    LastRestocked,
}

#[derive(DeriveIden)]
pub enum IngredientCosts {
    Table,
    Id,
    IngredientId,
    CostPerUnit,
    LastUpdated,
}

#[derive(DeriveIden)]
pub enum StockHistory {
    Table,
    Id,
    IngredientId,
    Operation,
    QuantityChange,
    QuantityBefore,
    QuantityAfter,
    TotalCost,
    PerformedBy,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum PreparedDishes {
    Table,
    Id,
    DishId,
    Quantity,
    MaxQuantity,
    PreparedAt,
    PreparedBy,
}
