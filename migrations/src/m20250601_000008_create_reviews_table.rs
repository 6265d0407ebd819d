use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reviews::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Reviews::UserId).uuid().not_null())
                    .col(ColumnDef::new(Reviews::DishId).uuid().not_null())
                    .col(ColumnDef::new(Reviews::OrderId).uuid().null())
                    .col(
                        ColumnDef::new(Reviews::Rating)
                            .small_integer()
                            .not_null()
                            .default(5),
                    )
                    .col(ColumnDef::new(Reviews::Comment).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Reviews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reviews::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One review per user per dish per order
        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_user_dish_order")
                    .table(Reviews::Table)
                    .col(Reviews::UserId)
                    .col(Reviews::DishId)
                    .col(Reviews::OrderId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reviews::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Reviews {
    Table,
    Id,
    UserId,
    DishId,
    OrderId,
    Rating,
    Comment,
    CreatedAt,
    UpdatedAt,
}
