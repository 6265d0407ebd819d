use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::billing::BalanceOverview,
    AppState,
};
use axum::{extract::State, Extension, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    pub amount: Decimal,
}

#[utoipa::path(
    get,
    path = "/api/v1/balance",
    responses((status = 200, description = "Balance, ledger and recent orders", body = BalanceOverview)),
    tag = "balance"
)]
pub async fn overview(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<BalanceOverview>, ServiceError> {
    Ok(Json(state.services.billing.overview(user.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/balance/deposit",
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Balance credited", body = BalanceOverview),
        (status = 400, description = "Non-positive amount", body = crate::errors::ErrorResponse)
    ),
    tag = "balance"
)]
pub async fn deposit(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<DepositRequest>,
) -> Result<Json<BalanceOverview>, ServiceError> {
    Ok(Json(
        state
            .services
            .billing
            .deposit(user.id, request.amount)
            .await?,
    ))
}
