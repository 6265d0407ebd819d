use crate::{
    auth::AuthUser,
    entities::combo_order::{self, ComboOrderStatus},
    errors::ServiceError,
    services::combos::{ComboSetResponse, CreateComboRequest},
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
pub struct UpdateComboOrderStatusRequest {
    pub status: ComboOrderStatus,
}

/// Buys a prepaid bundle; the whole bundle price is charged immediately.
#[utoipa::path(
    post,
    path = "/api/v1/combos",
    request_body = CreateComboRequest,
    responses(
        (status = 200, description = "Combo purchased", body = ComboSetResponse),
        (status = 402, description = "Insufficient balance", body = crate::errors::ErrorResponse)
    ),
    tag = "combos"
)]
pub async fn create_combo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateComboRequest>,
) -> Result<Json<ComboSetResponse>, ServiceError> {
    Ok(Json(state.services.combos.create(user.id, request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/combos",
    responses((status = 200, description = "The caller's usable combo sets", body = [ComboSetResponse])),
    tag = "combos"
)]
pub async fn my_combos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ComboSetResponse>>, ServiceError> {
    Ok(Json(state.services.combos.my_sets(user.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/combos/{id}/redeem",
    params(("id" = Uuid, Path, description = "Combo set id")),
    responses(
        (status = 200, description = "Redemption created, kitchen order queued"),
        (status = 400, description = "Set exhausted or inactive", body = crate::errors::ErrorResponse)
    ),
    tag = "combos"
)]
pub async fn redeem_combo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<combo_order::Model>, ServiceError> {
    Ok(Json(state.services.combos.redeem(id, user.id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/combos/orders",
    responses((status = 200, description = "The caller's redemptions")),
    tag = "combos"
)]
pub async fn my_combo_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<combo_order::Model>>, ServiceError> {
    Ok(Json(state.services.combos.my_redemptions(user.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/combos/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Combo order id")),
    responses(
        (status = 200, description = "Redemption cancelled, usage restored"),
        (status = 400, description = "Not cancellable", body = crate::errors::ErrorResponse)
    ),
    tag = "combos"
)]
pub async fn cancel_combo_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<combo_order::Model>, ServiceError> {
    Ok(Json(
        state.services.combos.cancel_redemption(id, user.id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/kitchen/combo-orders",
    responses((status = 200, description = "Redemptions to cook, oldest first")),
    tag = "kitchen"
)]
pub async fn kitchen_combo_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<combo_order::Model>>, ServiceError> {
    Ok(Json(state.services.combos.kitchen_queue().await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/combos/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Combo order id")),
    request_body = UpdateComboOrderStatusRequest,
    responses((status = 200, description = "Status changed")),
    tag = "kitchen"
)]
pub async fn update_combo_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateComboOrderStatusRequest>,
) -> Result<Json<combo_order::Model>, ServiceError> {
    Ok(Json(
        state
            .services
            .combos
            .update_redemption_status(id, request.status)
            .await?,
    ))
}
