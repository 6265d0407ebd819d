//! HTTP handlers, grouped per domain. Handlers validate the caller and
//! delegate to the services.

pub mod balance;
pub mod carts;
pub mod catalog;
pub mod combos;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod users;

use crate::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services,
};
use std::sync::Arc;

/// All domain services, wired once at startup and shared through
/// [`crate::AppState`].
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub catalog: Arc<services::CatalogService>,
    pub inventory: Arc<services::InventoryService>,
    pub carts: Arc<services::CartService>,
    pub orders: Arc<services::OrderService>,
    pub combos: Arc<services::ComboService>,
    pub billing: Arc<services::BillingService>,
    pub reviews: Arc<services::ReviewService>,
    pub users: Arc<services::UserService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, config: &AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(
            AuthConfig::new(config.jwt_secret.clone(), config.jwt_expiration),
            db.clone(),
        ));

        Self {
            auth,
            catalog: Arc::new(services::CatalogService::new(db.clone())),
            inventory: Arc::new(services::InventoryService::new(
                db.clone(),
                event_sender.clone(),
            )),
            carts: Arc::new(services::CartService::new(db.clone())),
            orders: Arc::new(services::OrderService::new(
                db.clone(),
                event_sender.clone(),
            )),
            combos: Arc::new(services::ComboService::new(
                db.clone(),
                event_sender.clone(),
            )),
            billing: Arc::new(services::BillingService::new(db.clone(), event_sender)),
            reviews: Arc::new(services::ReviewService::new(db.clone())),
            users: Arc::new(services::UserService::new(db)),
        }
    }
}
