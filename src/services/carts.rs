use crate::{
    entities::{
        cart::{self, CartStatus},
        cart_item, dish,
    },
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub dish_id: Uuid,
    pub dish_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub items: Vec<CartItemResponse>,
    pub subtotal: Decimal,
}

/// Server-side cart operations. One active cart per customer, created
/// lazily on first access.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Fetches the customer's active cart, creating an empty one if needed.
    pub async fn active_cart(&self, customer_id: Uuid) -> Result<cart::Model, ServiceError> {
        active_cart_on(&*self.db, customer_id).await
    }

    #[instrument(skip(self), fields(customer_id = %customer_id, dish_id = %dish_id))]
    pub async fn add_item(
        &self,
        customer_id: Uuid,
        dish_id: Uuid,
        quantity: i32,
    ) -> Result<CartResponse, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::InvalidInput(
                "quantity must be at least 1".into(),
            ));
        }

        let txn = self.db.begin().await?;

        let dish = dish::Entity::find_by_id(dish_id)
            .filter(dish::Column::IsAvailable.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("dish not found or unavailable".into()))?;

        let cart = active_cart_on(&txn, customer_id).await?;

        let existing = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::DishId.eq(dish_id))
            .one(&txn)
            .await?;

        match existing {
            Some(item) => {
                let new_quantity = item.quantity + quantity;
                let mut active: cart_item::ActiveModel = item.into();
                active.quantity = Set(new_quantity);
                active.unit_price = Set(dish.price);
                active.line_total = Set(dish.price * Decimal::from(new_quantity));
                active.update(&txn).await?;
            }
            None => {
                let row = cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart.id),
                    dish_id: Set(dish_id),
                    quantity: Set(quantity),
                    unit_price: Set(dish.price),
                    line_total: Set(dish.price * Decimal::from(quantity)),
                };
                row.insert(&txn).await?;
            }
        }

        let response = recalculate(&txn, cart).await?;
        txn.commit().await?;
        Ok(response)
    }

    /// Sets the quantity of a line; zero removes it.
    #[instrument(skip(self), fields(customer_id = %customer_id, dish_id = %dish_id))]
    pub async fn update_item(
        &self,
        customer_id: Uuid,
        dish_id: Uuid,
        quantity: i32,
    ) -> Result<CartResponse, ServiceError> {
        if quantity < 0 {
            return Err(ServiceError::InvalidInput(
                "quantity cannot be negative".into(),
            ));
        }

        let txn = self.db.begin().await?;
        let cart = active_cart_on(&txn, customer_id).await?;

        let item = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::DishId.eq(dish_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("dish is not in the cart".into()))?;

        if quantity == 0 {
            cart_item::Entity::delete_by_id(item.id).exec(&txn).await?;
        } else {
            let unit_price = item.unit_price;
            let mut active: cart_item::ActiveModel = item.into();
            active.quantity = Set(quantity);
            active.line_total = Set(unit_price * Decimal::from(quantity));
            active.update(&txn).await?;
        }

        let response = recalculate(&txn, cart).await?;
        txn.commit().await?;
        Ok(response)
    }

    pub async fn remove_item(
        &self,
        customer_id: Uuid,
        dish_id: Uuid,
    ) -> Result<CartResponse, ServiceError> {
        self.update_item(customer_id, dish_id, 0).await
    }

    pub async fn clear(&self, customer_id: Uuid) -> Result<CartResponse, ServiceError> {
        let txn = self.db.begin().await?;
        let cart = active_cart_on(&txn, customer_id).await?;

        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;

        let response = recalculate(&txn, cart).await?;
        txn.commit().await?;
        Ok(response)
    }

    /// Cart with priced lines, for display.
    pub async fn view(&self, customer_id: Uuid) -> Result<CartResponse, ServiceError> {
        let cart = self.active_cart(customer_id).await?;
        load_response(&*self.db, cart).await
    }
}

/// Fetch-or-create on any connection, so checkout can reuse it inside its
/// transaction.
pub async fn active_cart_on<C: ConnectionTrait>(
    conn: &C,
    customer_id: Uuid,
) -> Result<cart::Model, ServiceError> {
    let existing = cart::Entity::find()
        .filter(cart::Column::CustomerId.eq(customer_id))
        .filter(cart::Column::Status.eq(CartStatus::Active))
        .one(conn)
        .await?;

    match existing {
        Some(cart) => Ok(cart),
        None => {
            let row = cart::ActiveModel {
                id: Set(Uuid::new_v4()),
                customer_id: Set(customer_id),
                status: Set(CartStatus::Active),
                subtotal: Set(Decimal::ZERO),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
            };
            Ok(row.insert(conn).await?)
        }
    }
}

/// Marks a cart converted after a successful checkout.
pub async fn mark_converted<C: ConnectionTrait>(
    conn: &C,
    cart: cart::Model,
) -> Result<(), ServiceError> {
    let mut active: cart::ActiveModel = cart.into();
    active.status = Set(CartStatus::Converted);
    active.updated_at = Set(Utc::now());
    active.update(conn).await?;
    Ok(())
}

async fn recalculate<C: ConnectionTrait>(
    conn: &C,
    cart: cart::Model,
) -> Result<CartResponse, ServiceError> {
    let items = cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .all(conn)
        .await?;
    let subtotal: Decimal = items.iter().map(|i| i.line_total).sum();

    let mut active: cart::ActiveModel = cart.into();
    active.subtotal = Set(subtotal);
    active.updated_at = Set(Utc::now());
    let updated = active.update(conn).await?;

    load_response(conn, updated).await
}

async fn load_response<C: ConnectionTrait>(
    conn: &C,
    cart: cart::Model,
) -> Result<CartResponse, ServiceError> {
    let items = cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .find_also_related(dish::Entity)
        .all(conn)
        .await?;

    Ok(CartResponse {
        id: cart.id,
        subtotal: cart.subtotal,
        items: items
            .into_iter()
            .map(|(item, dish)| CartItemResponse {
                dish_id: item.dish_id,
                dish_name: dish.map(|d| d.name).unwrap_or_default(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.line_total,
            })
            .collect(),
    })
}
