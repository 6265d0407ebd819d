use crate::{
    auth::AuthUser,
    entities::{order::OrderStatus, review},
    errors::ServiceError,
    services::{orders::OrderResponse, reviews::CreateReviewRequest},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AdminOrderFilters {
    pub status: Option<OrderStatus>,
}

/// Checkout: converts the caller's cart into a paid order in one
/// transaction.
#[utoipa::path(
    post,
    path = "/api/v1/orders/checkout",
    responses(
        (status = 200, description = "Order created and paid", body = OrderResponse),
        (status = 402, description = "Insufficient balance", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<OrderResponse>, ServiceError> {
    Ok(Json(state.services.orders.checkout(user.id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses((status = 200, description = "The caller's in-progress orders", body = [OrderResponse])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<OrderResponse>>, ServiceError> {
    Ok(Json(state.services.orders.list_active(user.id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/history",
    responses((status = 200, description = "The caller's completed orders", body = [OrderResponse])),
    tag = "orders"
)]
pub async fn order_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<OrderResponse>>, ServiceError> {
    Ok(Json(state.services.orders.list_history(user.id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order detail", body = OrderResponse),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ServiceError> {
    Ok(Json(state.services.orders.get(id, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled and refunded", body = OrderResponse),
        (status = 400, description = "Not cancellable in this status", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ServiceError> {
    Ok(Json(state.services.orders.cancel(id, user.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/pickup",
    params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, description = "Order collected", body = OrderResponse)),
    tag = "orders"
)]
pub async fn pickup_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ServiceError> {
    Ok(Json(state.services.orders.pickup(id, user.id).await?))
}

/// Staff status transition; chefs may only move preparing orders to ready.
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderResponse),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, ServiceError> {
    Ok(Json(
        state
            .services
            .orders
            .update_status(id, request.status, &user)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/hide",
    params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, description = "Order hidden from the customer")),
    tag = "orders"
)]
pub async fn hide_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    state.services.orders.hide(id).await?;
    Ok(Json(serde_json::json!({ "hidden": true })))
}

#[utoipa::path(
    get,
    path = "/api/v1/kitchen/orders",
    responses((status = 200, description = "Orders to cook, oldest first", body = [OrderResponse])),
    tag = "kitchen"
)]
pub async fn kitchen_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, ServiceError> {
    Ok(Json(state.services.orders.kitchen_queue().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/orders",
    params(AdminOrderFilters),
    responses((status = 200, description = "All orders", body = [OrderResponse])),
    tag = "admin"
)]
pub async fn admin_orders(
    State(state): State<AppState>,
    Query(filters): Query<AdminOrderFilters>,
) -> Result<Json<Vec<OrderResponse>>, ServiceError> {
    Ok(Json(state.services.orders.admin_list(filters.status).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/reviews",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = CreateReviewRequest,
    responses(
        (status = 200, description = "Review stored"),
        (status = 409, description = "Already reviewed", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn add_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<review::Model>, ServiceError> {
    Ok(Json(
        state.services.reviews.create(id, user.id, request).await?,
    ))
}
