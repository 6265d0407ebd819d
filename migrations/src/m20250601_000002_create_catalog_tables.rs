use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(
                        ColumnDef::new(Categories::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Ingredients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Ingredients::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Ingredients::Name).string().not_null())
                    .col(ColumnDef::new(Ingredients::Unit).string_len(20).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Dishes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Dishes::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Dishes::Name).string().not_null())
                    .col(
                        ColumnDef::new(Dishes::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Dishes::Price).decimal_len(10, 2).not_null())
                    .col(ColumnDef::new(Dishes::CategoryId).uuid().not_null())
                    .col(
                        ColumnDef::new(Dishes::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Dishes::CreatedBy).uuid().null())
                    .col(
                        ColumnDef::new(Dishes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Recipe lines: one row per (dish, ingredient)
        manager
            .create_table(
                Table::create()
                    .table(DishIngredients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DishIngredients::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DishIngredients::DishId).uuid().not_null())
                    .col(
                        ColumnDef::new(DishIngredients::IngredientId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DishIngredients::Quantity)
                            .decimal_len(6, 2)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_dish_ingredients_dish_ingredient")
                    .table(DishIngredients::Table)
                    .col(DishIngredients::DishId)
                    .col(DishIngredients::IngredientId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DishIngredients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Dishes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ingredients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Categories {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
pub enum Ingredients {
    Table,
    Id,
    Name,
    Unit,
}

#[derive(DeriveIden)]
pub enum Dishes {
    Table,
    Id,
    Name,
    Description,
    Price,
    CategoryId,
    IsAvailable,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum DishIngredients {
    Table,
    Id,
    DishId,
    IngredientId,
    Quantity,
}
