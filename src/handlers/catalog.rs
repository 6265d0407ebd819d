use crate::{
    auth::AuthUser,
    entities::{category, ingredient},
    errors::ServiceError,
    services::catalog::{CreateDishRequest, DishResponse},
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
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub unit: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAvailabilityRequest {
    pub is_available: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/dishes",
    request_body = CreateDishRequest,
    responses(
        (status = 200, description = "Dish created with recipe", body = DishResponse),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_dish(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Json(request): Json<CreateDishRequest>,
) -> Result<Json<DishResponse>, ServiceError> {
    let dish = state
        .services
        .catalog
        .create_dish(request, admin.id)
        .await?;
    Ok(Json(dish))
}

#[utoipa::path(
    put,
    path = "/api/v1/dishes/{id}",
    params(("id" = Uuid, Path, description = "Dish id")),
    request_body = CreateDishRequest,
    responses(
        (status = 200, description = "Dish updated, recipe replaced", body = DishResponse),
        (status = 404, description = "Unknown dish", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn update_dish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateDishRequest>,
) -> Result<Json<DishResponse>, ServiceError> {
    Ok(Json(state.services.catalog.update_dish(id, request).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/dishes/{id}/availability",
    params(("id" = Uuid, Path, description = "Dish id")),
    request_body = SetAvailabilityRequest,
    responses((status = 200, description = "Availability toggled", body = DishResponse)),
    tag = "catalog"
)]
pub async fn set_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<DishResponse>, ServiceError> {
    Ok(Json(
        state
            .services
            .catalog
            .set_availability(id, request.is_available)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses((status = 200, description = "Category created")),
    tag = "catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<Json<category::Model>, ServiceError> {
    Ok(Json(
        state
            .services
            .catalog
            .create_category(request.name, request.description)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/ingredients",
    responses((status = 200, description = "All ingredients")),
    tag = "catalog"
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
) -> Result<Json<Vec<ingredient::Model>>, ServiceError> {
    Ok(Json(state.services.catalog.list_ingredients().await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/ingredients",
    request_body = CreateIngredientRequest,
    responses(
        (status = 200, description = "Ingredient created"),
        (status = 409, description = "Name already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_ingredient(
    State(state): State<AppState>,
    Json(request): Json<CreateIngredientRequest>,
) -> Result<Json<ingredient::Model>, ServiceError> {
    Ok(Json(
        state
            .services
            .catalog
            .create_ingredient(request.name, request.unit)
            .await?,
    ))
}
