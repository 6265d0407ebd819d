use crate::{
    auth::AuthUser,
    entities::user::Role,
    errors::ServiceError,
    services::users::{Statistics, UserSummary},
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
pub struct ChangeRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAllergensRequest {
    pub ingredient_ids: Vec<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    responses((status = 200, description = "All accounts", body = [UserSummary])),
    tag = "admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSummary>>, ServiceError> {
    Ok(Json(state.services.users.list().await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = ChangeRoleRequest,
    responses((status = 200, description = "Role changed", body = UserSummary)),
    tag = "admin"
)]
pub async fn change_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeRoleRequest>,
) -> Result<Json<UserSummary>, ServiceError> {
    Ok(Json(state.services.users.change_role(id, request.role).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    responses((status = 200, description = "Dashboard aggregates", body = Statistics)),
    tag = "admin"
)]
pub async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<Statistics>, ServiceError> {
    Ok(Json(state.services.users.statistics().await?))
}

/// Replaces the caller's allergen list; the menu starts filtering
/// immediately.
#[utoipa::path(
    put,
    path = "/api/v1/me/allergens",
    request_body = SetAllergensRequest,
    responses((status = 200, description = "Allergen list replaced")),
    tag = "profile"
)]
pub async fn set_allergens(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<SetAllergensRequest>,
) -> Result<Json<Vec<Uuid>>, ServiceError> {
    Ok(Json(
        state
            .services
            .users
            .set_allergens(user.id, request.ingredient_ids)
            .await?,
    ))
}
