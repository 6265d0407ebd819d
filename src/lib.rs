//! Cantina API Library
//!
//! Backend for a school cafeteria: menu and recipes, server-side carts,
//! stored-value balance payments, ingredient stock tracking and order
//! fulfilment.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::{AuthRouterExt, Role};

const STAFF: &[Role] = &[Role::Chef, Role::Admin];
const ANY_ROLE: &[Role] = &[Role::Student, Role::Chef, Role::Admin];

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// All `/api/v1` routes, grouped by the role that may call them.
pub fn api_v1_routes() -> Router<AppState> {
    // Anyone, authenticated or not: browse the menu.
    let public = Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .route("/menu", get(handlers::menu::menu))
        .route("/categories", get(handlers::menu::list_categories))
        .route("/dishes/:id", get(handlers::menu::get_dish))
        .route("/dishes/:id/reviews", get(handlers::menu::dish_reviews));

    // Students: cart, checkout, combos, balance, reviews, allergens.
    let student = Router::new()
        .route(
            "/cart",
            get(handlers::carts::view_cart).delete(handlers::carts::clear_cart),
        )
        .route("/cart/items", post(handlers::carts::add_item))
        .route(
            "/cart/items/:dish_id",
            put(handlers::carts::update_item).delete(handlers::carts::remove_item),
        )
        .route("/orders/checkout", post(handlers::orders::checkout))
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders/history", get(handlers::orders::order_history))
        .route("/orders/:id/cancel", post(handlers::orders::cancel_order))
        .route("/orders/:id/pickup", post(handlers::orders::pickup_order))
        .route("/orders/:id/reviews", post(handlers::orders::add_review))
        .route(
            "/combos",
            get(handlers::combos::my_combos).post(handlers::combos::create_combo),
        )
        .route("/combos/:id/redeem", post(handlers::combos::redeem_combo))
        .route("/combos/orders", get(handlers::combos::my_combo_orders))
        .route(
            "/combos/orders/:id/cancel",
            post(handlers::combos::cancel_combo_order),
        )
        .route("/balance", get(handlers::balance::overview))
        .route("/balance/deposit", post(handlers::balance::deposit))
        .route("/me/allergens", put(handlers::users::set_allergens))
        .with_role(Role::Student);

    // Any signed-in account: order detail (ownership checked in the service).
    let authenticated = Router::new()
        .route("/orders/:id", get(handlers::orders::get_order))
        .with_any_role(ANY_ROLE);

    // Kitchen staff: queues, prepared shelf, status transitions, stock.
    let staff = Router::new()
        .route("/kitchen/orders", get(handlers::orders::kitchen_orders))
        .route(
            "/kitchen/combo-orders",
            get(handlers::combos::kitchen_combo_orders),
        )
        .route(
            "/kitchen/prepared",
            get(handlers::inventory::list_prepared).post(handlers::inventory::prepare_dish),
        )
        .route(
            "/kitchen/prepared/:id/max",
            put(handlers::inventory::set_prepared_max),
        )
        .route(
            "/orders/:id/status",
            put(handlers::orders::update_order_status),
        )
        .route(
            "/combos/orders/:id/status",
            put(handlers::combos::update_combo_order_status),
        )
        .route("/inventory", get(handlers::inventory::list_stocks))
        .route("/inventory/history", get(handlers::inventory::history))
        .route(
            "/inventory/:ingredient_id/restock",
            post(handlers::inventory::restock),
        )
        .route(
            "/inventory/:ingredient_id/adjust",
            post(handlers::inventory::adjust),
        )
        .route(
            "/inventory/:ingredient_id/waste",
            post(handlers::inventory::waste),
        )
        .route(
            "/inventory/:ingredient_id/request",
            post(handlers::inventory::request_restock),
        )
        .route(
            "/availability/:dish_id",
            get(handlers::inventory::check_availability),
        )
        .with_any_role(STAFF);

    // Admins: catalog management, user administration, reporting.
    let admin = Router::new()
        .route("/dishes", post(handlers::catalog::create_dish))
        .route("/dishes/:id", put(handlers::catalog::update_dish))
        .route(
            "/dishes/:id/availability",
            put(handlers::catalog::set_availability),
        )
        .route("/categories", post(handlers::catalog::create_category))
        .route(
            "/ingredients",
            get(handlers::catalog::list_ingredients).post(handlers::catalog::create_ingredient),
        )
        .route(
            "/inventory/:ingredient_id/cost",
            put(handlers::inventory::set_cost),
        )
        .route("/orders/:id/hide", post(handlers::orders::hide_order))
        .route("/admin/orders", get(handlers::orders::admin_orders))
        .route("/admin/users", get(handlers::users::list_users))
        .route(
            "/admin/users/:id/role",
            put(handlers::users::change_role),
        )
        .route("/admin/stats", get(handlers::users::statistics))
        .with_role(Role::Admin);

    Router::new()
        .merge(public)
        .merge(student)
        .merge(authenticated)
        .merge(staff)
        .merge(admin)
}

async fn api_status() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "cantina-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Json(json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
