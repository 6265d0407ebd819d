use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::carts::CartResponse,
    AppState,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub dish_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    /// Zero removes the line
    pub quantity: i32,
}

#[utoipa::path(
    get,
    path = "/api/v1/cart",
    responses((status = 200, description = "The caller's active cart", body = CartResponse)),
    tag = "cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CartResponse>, ServiceError> {
    Ok(Json(state.services.carts.view(user.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Item added, cart repriced", body = CartResponse),
        (status = 404, description = "Dish unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>, ServiceError> {
    Ok(Json(
        state
            .services
            .carts
            .add_item(user.id, request.dish_id, request.quantity)
            .await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/cart/items/{dish_id}",
    params(("dish_id" = Uuid, Path, description = "Dish id")),
    request_body = UpdateCartItemRequest,
    responses((status = 200, description = "Quantity updated", body = CartResponse)),
    tag = "cart"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(dish_id): Path<Uuid>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<CartResponse>, ServiceError> {
    Ok(Json(
        state
            .services
            .carts
            .update_item(user.id, dish_id, request.quantity)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{dish_id}",
    params(("dish_id" = Uuid, Path, description = "Dish id")),
    responses((status = 200, description = "Line removed", body = CartResponse)),
    tag = "cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(dish_id): Path<Uuid>,
) -> Result<Json<CartResponse>, ServiceError> {
    Ok(Json(
        state.services.carts.remove_item(user.id, dish_id).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    responses((status = 200, description = "Cart emptied", body = CartResponse)),
    tag = "cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CartResponse>, ServiceError> {
    Ok(Json(state.services.carts.clear(user.id).await?))
}
