use crate::{
    auth::AuthUser,
    entities::{ingredient_cost, prepared_dish, stock_history},
    errors::ServiceError,
    services::inventory::{AvailabilityReport, StockResponse},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct StockFilters {
    /// Only rows at or below their minimum
    pub low_stock: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryFilters {
    pub ingredient_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AvailabilityQuery {
    /// Requested number of servings, defaults to 1
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuantityRequest {
    pub quantity: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustRequest {
    pub new_quantity: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetCostRequest {
    pub cost_per_unit: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PrepareDishRequest {
    pub dish_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPreparedMaxRequest {
    pub max_quantity: i32,
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(StockFilters),
    responses((status = 200, description = "Stock levels", body = [StockResponse])),
    tag = "inventory"
)]
pub async fn list_stocks(
    State(state): State<AppState>,
    Query(filters): Query<StockFilters>,
) -> Result<Json<Vec<StockResponse>>, ServiceError> {
    Ok(Json(
        state
            .services
            .inventory
            .list_stocks(filters.low_stock.unwrap_or(false))
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/{ingredient_id}/restock",
    params(("ingredient_id" = Uuid, Path, description = "Ingredient id")),
    request_body = QuantityRequest,
    responses((status = 200, description = "Stock replenished", body = StockResponse)),
    tag = "inventory"
)]
pub async fn restock(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ingredient_id): Path<Uuid>,
    Json(request): Json<QuantityRequest>,
) -> Result<Json<StockResponse>, ServiceError> {
    Ok(Json(
        state
            .services
            .inventory
            .restock(ingredient_id, request.quantity, Some(user.id), request.notes)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/{ingredient_id}/adjust",
    params(("ingredient_id" = Uuid, Path, description = "Ingredient id")),
    request_body = AdjustRequest,
    responses((status = 200, description = "Stock set to an absolute value", body = StockResponse)),
    tag = "inventory"
)]
pub async fn adjust(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ingredient_id): Path<Uuid>,
    Json(request): Json<AdjustRequest>,
) -> Result<Json<StockResponse>, ServiceError> {
    Ok(Json(
        state
            .services
            .inventory
            .adjust(
                ingredient_id,
                request.new_quantity,
                Some(user.id),
                request.notes,
            )
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/{ingredient_id}/waste",
    params(("ingredient_id" = Uuid, Path, description = "Ingredient id")),
    request_body = QuantityRequest,
    responses(
        (status = 200, description = "Stock written off", body = StockResponse),
        (status = 400, description = "More than on hand", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn waste(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ingredient_id): Path<Uuid>,
    Json(request): Json<QuantityRequest>,
) -> Result<Json<StockResponse>, ServiceError> {
    Ok(Json(
        state
            .services
            .inventory
            .waste(ingredient_id, request.quantity, Some(user.id), request.notes)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/{ingredient_id}/request",
    params(("ingredient_id" = Uuid, Path, description = "Ingredient id")),
    request_body = QuantityRequest,
    responses((status = 200, description = "Restock request recorded in the ledger")),
    tag = "inventory"
)]
pub async fn request_restock(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ingredient_id): Path<Uuid>,
    Json(request): Json<QuantityRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    state
        .services
        .inventory
        .request_restock(ingredient_id, request.quantity, Some(user.id), request.notes)
        .await?;
    Ok(Json(serde_json::json!({ "requested": true })))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/history",
    params(HistoryFilters),
    responses((status = 200, description = "Stock movement ledger, newest first")),
    tag = "inventory"
)]
pub async fn history(
    State(state): State<AppState>,
    Query(filters): Query<HistoryFilters>,
) -> Result<Json<Vec<stock_history::Model>>, ServiceError> {
    Ok(Json(
        state
            .services
            .inventory
            .history(filters.ingredient_id)
            .await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/inventory/{ingredient_id}/cost",
    params(("ingredient_id" = Uuid, Path, description = "Ingredient id")),
    request_body = SetCostRequest,
    responses((status = 200, description = "Cost per unit stored")),
    tag = "inventory"
)]
pub async fn set_cost(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
    Json(request): Json<SetCostRequest>,
) -> Result<Json<ingredient_cost::Model>, ServiceError> {
    Ok(Json(
        state
            .services
            .inventory
            .set_cost(ingredient_id, request.cost_per_unit)
            .await?,
    ))
}

/// Can the kitchen cook `quantity` servings of this dish right now?
#[utoipa::path(
    get,
    path = "/api/v1/availability/{dish_id}",
    params(
        ("dish_id" = Uuid, Path, description = "Dish id"),
        AvailabilityQuery
    ),
    responses((status = 200, description = "Availability with missing ingredients", body = AvailabilityReport)),
    tag = "inventory"
)]
pub async fn check_availability(
    State(state): State<AppState>,
    Path(dish_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityReport>, ServiceError> {
    Ok(Json(
        state
            .services
            .inventory
            .check_availability(dish_id, query.quantity.unwrap_or(1))
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/kitchen/prepared",
    responses((status = 200, description = "Prepared dish shelf")),
    tag = "kitchen"
)]
pub async fn list_prepared(
    State(state): State<AppState>,
) -> Result<Json<Vec<prepared_dish::Model>>, ServiceError> {
    Ok(Json(state.services.inventory.list_prepared().await?))
}

/// Cook more units: reserves raw ingredients and fills the shelf.
#[utoipa::path(
    post,
    path = "/api/v1/kitchen/prepared",
    request_body = PrepareDishRequest,
    responses(
        (status = 200, description = "Units cooked onto the shelf"),
        (status = 422, description = "Insufficient ingredients", body = crate::errors::ErrorResponse)
    ),
    tag = "kitchen"
)]
pub async fn prepare_dish(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<PrepareDishRequest>,
) -> Result<Json<prepared_dish::Model>, ServiceError> {
    Ok(Json(
        state
            .services
            .inventory
            .prepare_dish(request.dish_id, request.quantity, user.id)
            .await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/kitchen/prepared/{id}/max",
    params(("id" = Uuid, Path, description = "Prepared row id")),
    request_body = SetPreparedMaxRequest,
    responses((status = 200, description = "Cap adjusted")),
    tag = "kitchen"
)]
pub async fn set_prepared_max(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetPreparedMaxRequest>,
) -> Result<Json<prepared_dish::Model>, ServiceError> {
    Ok(Json(
        state
            .services
            .inventory
            .set_prepared_max(id, request.max_quantity)
            .await?,
    ))
}
