//! OpenAPI documentation, served through Swagger UI at `/swagger-ui`.

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{auth, errors, handlers, services};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cantina API",
        description = "School cafeteria backend: menu, carts, balance payments, ingredient stock and order fulfilment",
        license(name = "MIT")
    ),
    paths(
        handlers::menu::menu,
        handlers::menu::list_categories,
        handlers::menu::get_dish,
        handlers::menu::dish_reviews,
        handlers::carts::view_cart,
        handlers::carts::add_item,
        handlers::carts::update_item,
        handlers::carts::remove_item,
        handlers::carts::clear_cart,
        handlers::orders::checkout,
        handlers::orders::list_orders,
        handlers::orders::order_history,
        handlers::orders::get_order,
        handlers::orders::cancel_order,
        handlers::orders::pickup_order,
        handlers::orders::update_order_status,
        handlers::orders::hide_order,
        handlers::orders::kitchen_orders,
        handlers::orders::admin_orders,
        handlers::orders::add_review,
        handlers::combos::create_combo,
        handlers::combos::my_combos,
        handlers::combos::redeem_combo,
        handlers::combos::my_combo_orders,
        handlers::combos::cancel_combo_order,
        handlers::combos::kitchen_combo_orders,
        handlers::combos::update_combo_order_status,
        handlers::inventory::list_stocks,
        handlers::inventory::restock,
        handlers::inventory::adjust,
        handlers::inventory::waste,
        handlers::inventory::request_restock,
        handlers::inventory::history,
        handlers::inventory::set_cost,
        handlers::inventory::check_availability,
        handlers::inventory::list_prepared,
        handlers::inventory::prepare_dish,
        handlers::inventory::set_prepared_max,
        handlers::balance::overview,
        handlers::balance::deposit,
        handlers::users::list_users,
        handlers::users::change_role,
        handlers::users::statistics,
        handlers::users::set_allergens,
        handlers::catalog::create_dish,
        handlers::catalog::update_dish,
        handlers::catalog::set_availability,
        handlers::catalog::create_category,
        handlers::catalog::list_ingredients,
        handlers::catalog::create_ingredient,
    ),
    components(schemas(
        errors::ErrorResponse,
        auth::TokenPair,
        auth::ProfileResponse,
        services::catalog::MenuResponse,
        services::catalog::DishResponse,
        services::carts::CartResponse,
        services::orders::OrderResponse,
        services::combos::ComboSetResponse,
        services::inventory::StockResponse,
        services::inventory::AvailabilityReport,
        services::billing::BalanceOverview,
        services::users::Statistics,
    )),
    tags(
        (name = "menu", description = "Menu browsing"),
        (name = "cart", description = "Student cart"),
        (name = "orders", description = "Order lifecycle"),
        (name = "combos", description = "Prepaid combo bundles"),
        (name = "kitchen", description = "Chef queues and prepared shelf"),
        (name = "inventory", description = "Ingredient stock"),
        (name = "balance", description = "Stored-value balance"),
        (name = "admin", description = "Administration"),
        (name = "profile", description = "Caller profile"),
        (name = "auth", description = "Authentication")
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
