use crate::{
    auth::AuthUser,
    entities::{category, review},
    errors::ServiceError,
    services::catalog::{DishResponse, MenuResponse},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct MenuFilters {
    /// Restrict to one category
    pub category: Option<Uuid>,
}

/// The menu as the caller sees it. Students get their allergen filter
/// applied; everyone else sees every available dish.
#[utoipa::path(
    get,
    path = "/api/v1/menu",
    params(MenuFilters),
    responses(
        (status = 200, description = "Available dishes", body = MenuResponse)
    ),
    tag = "menu"
)]
pub async fn menu(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthUser>>,
    Query(filters): Query<MenuFilters>,
) -> Result<Json<MenuResponse>, ServiceError> {
    let allergen_filter_for = auth_user
        .as_ref()
        .filter(|Extension(u)| u.role.can_use_cart())
        .map(|Extension(u)| u.id);

    let menu = state
        .services
        .catalog
        .menu(filters.category, allergen_filter_for)
        .await?;
    Ok(Json(menu))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses((status = 200, description = "All categories")),
    tag = "menu"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<category::Model>>, ServiceError> {
    Ok(Json(state.services.catalog.list_categories().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/dishes/{id}",
    params(("id" = Uuid, Path, description = "Dish id")),
    responses(
        (status = 200, description = "Dish with recipe and rating", body = DishResponse),
        (status = 404, description = "Unknown dish", body = crate::errors::ErrorResponse)
    ),
    tag = "menu"
)]
pub async fn get_dish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DishResponse>, ServiceError> {
    Ok(Json(state.services.catalog.get_dish(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/dishes/{id}/reviews",
    params(("id" = Uuid, Path, description = "Dish id")),
    responses((status = 200, description = "Reviews for the dish")),
    tag = "menu"
)]
pub async fn dish_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<review::Model>>, ServiceError> {
    Ok(Json(state.services.reviews.list_for_dish(id).await?))
}
