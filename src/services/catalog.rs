use crate::{
    entities::{
        category, dish, dish_ingredient, ingredient, prepared_dish, review, user_allergen,
    },
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecipeLineRequest {
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDishRequest {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub category_id: Uuid,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub recipe: Vec<RecipeLineRequest>,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeLineResponse {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub quantity: Decimal,
    pub unit: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DishResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: Uuid,
    pub category_name: String,
    pub is_available: bool,
    pub prepared_available: i32,
    pub average_rating: Option<f64>,
    pub recipe: Vec<RecipeLineResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuResponse {
    pub dishes: Vec<DishResponse>,
    /// Dishes hidden from this viewer because of allergens.
    pub hidden_by_allergens: usize,
}

/// Menu assembly and admin catalog management.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    pub async fn create_category(
        &self,
        name: String,
        description: String,
    ) -> Result<category::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError("name is required".into()));
        }
        let row = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_string()),
            description: Set(description),
        };
        Ok(row.insert(&*self.db).await?)
    }

    pub async fn list_ingredients(&self) -> Result<Vec<ingredient::Model>, ServiceError> {
        Ok(ingredient::Entity::find()
            .order_by_asc(ingredient::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Creates an ingredient; names are deduplicated case-insensitively.
    pub async fn create_ingredient(
        &self,
        name: String,
        unit: String,
    ) -> Result<ingredient::Model, ServiceError> {
        let name = name.trim().to_string();
        let unit = unit.trim().to_string();
        if name.is_empty() || unit.is_empty() {
            return Err(ServiceError::ValidationError(
                "both name and unit are required".into(),
            ));
        }

        let existing = ingredient::Entity::find().all(&*self.db).await?;
        if existing
            .iter()
            .any(|i| i.name.eq_ignore_ascii_case(&name))
        {
            return Err(ServiceError::Conflict(format!(
                "ingredient '{}' already exists",
                name
            )));
        }

        let row = ingredient::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            unit: Set(unit),
        };
        Ok(row.insert(&*self.db).await?)
    }

    /// The menu as one viewer sees it: available dishes, optionally one
    /// category, with dishes containing the viewer's allergens removed.
    #[instrument(skip(self))]
    pub async fn menu(
        &self,
        category_id: Option<Uuid>,
        allergen_filter_for: Option<Uuid>,
    ) -> Result<MenuResponse, ServiceError> {
        let mut query = dish::Entity::find()
            .filter(dish::Column::IsAvailable.eq(true))
            .order_by_asc(dish::Column::Name);
        if let Some(category_id) = category_id {
            query = query.filter(dish::Column::CategoryId.eq(category_id));
        }
        let dishes = query.all(&*self.db).await?;

        let allergens: HashSet<Uuid> = match allergen_filter_for {
            Some(user_id) => user_allergen::Entity::find()
                .filter(user_allergen::Column::UserId.eq(user_id))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|a| a.ingredient_id)
                .collect(),
            None => HashSet::new(),
        };

        let mut out = Vec::new();
        let mut hidden = 0usize;
        for d in dishes {
            let response = self.dish_response(&*self.db, d).await?;
            if !allergens.is_empty()
                && response
                    .recipe
                    .iter()
                    .any(|line| allergens.contains(&line.ingredient_id))
            {
                hidden += 1;
                continue;
            }
            out.push(response);
        }

        Ok(MenuResponse {
            dishes: out,
            hidden_by_allergens: hidden,
        })
    }

    pub async fn get_dish(&self, dish_id: Uuid) -> Result<DishResponse, ServiceError> {
        let d = dish::Entity::find_by_id(dish_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("dish not found".into()))?;
        self.dish_response(&*self.db, d).await
    }

    /// Creates a dish together with its recipe lines in one transaction.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_dish(
        &self,
        request: CreateDishRequest,
        created_by: Uuid,
    ) -> Result<DishResponse, ServiceError> {
        request.validate()?;
        if request.price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must be positive".into(),
            ));
        }

        let txn = self.db.begin().await?;

        category::Entity::find_by_id(request.category_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("category not found".into()))?;

        let dish_id = Uuid::new_v4();
        let row = dish::ActiveModel {
            id: Set(dish_id),
            name: Set(request.name),
            description: Set(request.description),
            price: Set(request.price),
            category_id: Set(request.category_id),
            is_available: Set(request.is_available),
            created_by: Set(Some(created_by)),
            created_at: Set(Utc::now()),
        };
        let created = row.insert(&txn).await?;

        insert_recipe(&txn, dish_id, &request.recipe).await?;

        txn.commit().await?;
        info!(dish_id = %dish_id, "dish created");
        self.dish_response(&*self.db, created).await
    }

    /// Updates a dish; when a recipe is supplied the old lines are replaced
    /// wholesale, mirroring how the kitchen edits recipes.
    #[instrument(skip(self, request), fields(dish_id = %dish_id))]
    pub async fn update_dish(
        &self,
        dish_id: Uuid,
        request: CreateDishRequest,
    ) -> Result<DishResponse, ServiceError> {
        request.validate()?;
        if request.price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must be positive".into(),
            ));
        }

        let txn = self.db.begin().await?;

        let existing = dish::Entity::find_by_id(dish_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("dish not found".into()))?;

        category::Entity::find_by_id(request.category_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("category not found".into()))?;

        let mut active: dish::ActiveModel = existing.into();
        active.name = Set(request.name);
        active.description = Set(request.description);
        active.price = Set(request.price);
        active.category_id = Set(request.category_id);
        active.is_available = Set(request.is_available);
        let updated = active.update(&txn).await?;

        dish_ingredient::Entity::delete_many()
            .filter(dish_ingredient::Column::DishId.eq(dish_id))
            .exec(&txn)
            .await?;
        insert_recipe(&txn, dish_id, &request.recipe).await?;

        txn.commit().await?;
        self.dish_response(&*self.db, updated).await
    }

    pub async fn set_availability(
        &self,
        dish_id: Uuid,
        is_available: bool,
    ) -> Result<DishResponse, ServiceError> {
        let existing = dish::Entity::find_by_id(dish_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("dish not found".into()))?;
        let mut active: dish::ActiveModel = existing.into();
        active.is_available = Set(is_available);
        let updated = active.update(&*self.db).await?;
        self.dish_response(&*self.db, updated).await
    }

    async fn dish_response<C: ConnectionTrait>(
        &self,
        conn: &C,
        d: dish::Model,
    ) -> Result<DishResponse, ServiceError> {
        let category_name = category::Entity::find_by_id(d.category_id)
            .one(conn)
            .await?
            .map(|c| c.name)
            .unwrap_or_default();

        let recipe = dish_ingredient::Entity::find()
            .filter(dish_ingredient::Column::DishId.eq(d.id))
            .find_also_related(ingredient::Entity)
            .all(conn)
            .await?;

        let prepared_available: i32 = prepared_dish::Entity::find()
            .filter(prepared_dish::Column::DishId.eq(d.id))
            .all(conn)
            .await?
            .iter()
            .map(|p| p.quantity)
            .sum();

        let ratings: Vec<i16> = review::Entity::find()
            .filter(review::Column::DishId.eq(d.id))
            .all(conn)
            .await?
            .iter()
            .map(|r| r.rating)
            .collect();
        let average_rating = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().map(|r| *r as f64).sum::<f64>() / ratings.len() as f64)
        };

        Ok(DishResponse {
            id: d.id,
            name: d.name,
            description: d.description,
            price: d.price,
            category_id: d.category_id,
            category_name,
            is_available: d.is_available,
            prepared_available,
            average_rating,
            recipe: recipe
                .into_iter()
                .map(|(line, ing)| {
                    let (ingredient_name, unit) = ing
                        .map(|i| (i.name, i.unit))
                        .unwrap_or_default();
                    RecipeLineResponse {
                        ingredient_id: line.ingredient_id,
                        ingredient_name,
                        quantity: line.quantity,
                        unit,
                    }
                })
                .collect(),
        })
    }
}

async fn insert_recipe<C: ConnectionTrait>(
    conn: &C,
    dish_id: Uuid,
    recipe: &[RecipeLineRequest],
) -> Result<(), ServiceError> {
    let mut seen = HashSet::new();
    for line in recipe {
        if line.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "recipe quantities must be positive".into(),
            ));
        }
        if !seen.insert(line.ingredient_id) {
            return Err(ServiceError::ValidationError(
                "an ingredient cannot appear twice in a recipe".into(),
            ));
        }
        ingredient::Entity::find_by_id(line.ingredient_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("ingredient {} not found", line.ingredient_id))
            })?;

        let row = dish_ingredient::ActiveModel {
            id: Set(Uuid::new_v4()),
            dish_id: Set(dish_id),
            ingredient_id: Set(line.ingredient_id),
            quantity: Set(line.quantity),
        };
        row.insert(conn).await?;
    }
    Ok(())
}
