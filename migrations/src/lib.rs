pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_users_table;
mod m20250601_000002_create_catalog_tables;
mod m20250601_000003_create_inventory_tables;
mod m20250601_000004_create_carts_tables;
mod m20250601_000005_create_orders_tables;
mod m20250601_000006_create_combo_tables;
mod m20250601_000007_create_billing_tables;
mod m20250601_000008_create_reviews_table;
mod m20250601_000009_create_user_allergens_table;
mod m20250610_000010_add_lookup_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_users_table::Migration),
            Box::new(m20250601_000002_create_catalog_tables::Migration),
            Box::new(m20250601_000003_create_inventory_tables::Migration),
            Box::new(m20250601_000004_create_carts_tables::Migration),
            Box::new(m20250601_000005_create_orders_tables::Migration),
            Box::new(m20250601_000006_create_combo_tables::Migration),
            Box::new(m20250601_000007_create_billing_tables::Migration),
            Box::new(m20250601_000008_create_reviews_table::Migration),
            Box::new(m20250601_000009_create_user_allergens_table::Migration),
            Box::new(m20250610_000010_add_lookup_indexes::Migration),
        ]
    }
}
