use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Covering indexes for the hot read paths: customer order lists, the chef
// queue, stock ledgers and cart lookups.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_customer_status")
                    .table(Orders::Table)
                    .col(Orders::CustomerId)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_status_created")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .col(Orders::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_items_order")
                    .table(OrderItems::Table)
                    .col(OrderItems::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_history_ingredient_created")
                    .table(StockHistory::Table)
                    .col(StockHistory::IngredientId)
                    .col(StockHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_carts_customer_status")
                    .table(Carts::Table)
                    .col(Carts::CustomerId)
                    .col(Carts::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_prepared_dishes_dish")
                    .table(PreparedDishes::Table)
                    .col(PreparedDishes::DishId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_balance_transactions_user_created")
                    .table(BalanceTransactions::Table)
                    .col(BalanceTransactions::UserId)
                    .col(BalanceTransactions::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_customer_status")
                    .table(Orders::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_status_created")
                    .table(Orders::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_order_items_order")
                    .table(OrderItems::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_stock_history_ingredient_created")
                    .table(StockHistory::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_carts_customer_status")
                    .table(Carts::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_prepared_dishes_dish")
                    .table(PreparedDishes::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_balance_transactions_user_created")
                    .table(BalanceTransactions::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    CustomerId,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum OrderItems {
    Table,
    OrderId,
}

#[derive(DeriveIden)]
enum StockHistory {
    Table,
    IngredientId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Carts {
    Table,
    CustomerId,
    Status,
}

#[derive(DeriveIden)]
enum PreparedDishes {
    Table,
    DishId,
}

#[derive(DeriveIden)]
enum BalanceTransactions {
    Table,
    UserId,
    CreatedAt,
}
