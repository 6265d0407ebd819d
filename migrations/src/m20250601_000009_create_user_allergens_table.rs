use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserAllergens::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserAllergens::UserId).uuid().not_null())
                    .col(ColumnDef::new(UserAllergens::IngredientId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(UserAllergens::UserId)
                            .col(UserAllergens::IngredientId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserAllergens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum UserAllergens {
    Table,
    UserId,
    IngredientId,
}
