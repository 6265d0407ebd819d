use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ComboSets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ComboSets::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(ComboSets::Name).string().not_null())
                    .col(
                        ColumnDef::new(ComboSets::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(ComboSets::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(ComboSets::TotalPrice)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ComboSets::MaxOrders)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(ComboSets::OrdersUsed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ComboSets::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ComboSets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ComboItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ComboItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ComboItems::ComboSetId).uuid().not_null())
                    .col(ColumnDef::new(ComboItems::DishId).uuid().not_null())
                    .col(
                        ColumnDef::new(ComboItems::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ComboOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ComboOrders::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ComboOrders::ComboSetId).uuid().not_null())
                    .col(ColumnDef::new(ComboOrders::CustomerId).uuid().not_null())
                    .col(
                        ColumnDef::new(ComboOrders::Status)
                            .string_len(20)
                            .not_null()
                            .default("preparing"),
                    )
                    .col(ColumnDef::new(ComboOrders::MainOrderId).uuid().null())
                    .col(
                        ColumnDef::new(ComboOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ComboOrders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ComboOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ComboItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ComboSets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ComboSets {
    Table,
    Id,
    Name,
    Description,
    CreatedBy,
    TotalPrice,
    MaxOrders,
    OrdersUsed,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum ComboItems {
    Table,
    Id,
    ComboSetId,
    DishId,
    Quantity,
}

#[derive(DeriveIden)]
pub enum ComboOrders {
    Table,
    Id,
    ComboSetId,
    CustomerId,
    Status,
    MainOrderId,
    CreatedAt,
    UpdatedAt,
}
