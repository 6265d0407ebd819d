//! Domain services. Handlers stay thin; every business rule lives here.
//!
//! Multi-row mutations (stock reservation, checkout, combo purchase and
//! redemption, balance changes) run inside a single database transaction;
//! helper functions that must compose into a caller's transaction are
//! generic over [`sea_orm::ConnectionTrait`].

pub mod billing;
pub mod carts;
pub mod catalog;
pub mod combos;
pub mod inventory;
pub mod orders;
pub mod reviews;
pub mod users;

pub use billing::BillingService;
pub use carts::CartService;
pub use catalog::CatalogService;
pub use combos::ComboService;
pub use inventory::InventoryService;
pub use orders::OrderService;
pub use reviews::ReviewService;
pub use users::UserService;
