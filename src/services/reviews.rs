use crate::{
    entities::{
        order::{self, OrderStatus},
        order_item, review,
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub dish_id: Uuid,
    /// 1..=5 stars
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

/// Dish reviews, only for completed orders that contained the dish.
#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(order_id = %order_id, user_id = %user_id))]
    pub async fn create(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        request: CreateReviewRequest,
    ) -> Result<review::Model, ServiceError> {
        if !(1..=5).contains(&request.rating) {
            return Err(ServiceError::ValidationError(
                "rating must be between 1 and 5".into(),
            ));
        }

        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("order not found".into()))?;
        if order.customer_id != user_id {
            return Err(ServiceError::Forbidden("not your order".into()));
        }
        if !matches!(
            order.status,
            OrderStatus::PickedUp | OrderStatus::Delivered
        ) {
            return Err(ServiceError::InvalidOperation(
                "reviews are only allowed for completed orders".into(),
            ));
        }

        let contained = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .filter(order_item::Column::DishId.eq(request.dish_id))
            .one(&*self.db)
            .await?;
        if contained.is_none() {
            return Err(ServiceError::InvalidOperation(
                "this dish was not part of the order".into(),
            ));
        }

        let duplicate = review::Entity::find()
            .filter(review::Column::UserId.eq(user_id))
            .filter(review::Column::DishId.eq(request.dish_id))
            .filter(review::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(
                "you already reviewed this dish for this order".into(),
            ));
        }

        let row = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            dish_id: Set(request.dish_id),
            order_id: Set(Some(order_id)),
            rating: Set(request.rating),
            comment: Set(request.comment),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        Ok(row.insert(&*self.db).await?)
    }

    pub async fn list_for_dish(&self, dish_id: Uuid) -> Result<Vec<review::Model>, ServiceError> {
        Ok(review::Entity::find()
            .filter(review::Column::DishId.eq(dish_id))
            .order_by_desc(review::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }
}
