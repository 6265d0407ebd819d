use crate::{
    auth::AuthUser,
    entities::{
        balance_transaction::TransactionKind,
        cart_item, dish,
        order::{self, OrderStatus},
        order_item::{self, OrderItemStatus},
        order_pickup,
        payment::{self, PaymentMethod, PaymentStatus},
        user::{self, Role},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{billing, carts, inventory},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub dish_id: Uuid,
    pub dish_name: String,
    pub quantity: i32,
    pub price_at_time: Decimal,
    pub line_total: Decimal,
    pub status: OrderItemStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub notes: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub items: Vec<OrderItemResponse>,
}

/// Order lifecycle: checkout, queues, status transitions, cancellation with
/// compensation, pickup.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Converts the customer's active cart into a paid order.
    ///
    /// Everything happens in one transaction: prepared units are consumed
    /// first, the remainder is cooked-to-order via ingredient reservation,
    /// the balance is debited with a ledger row, a payment is recorded and
    /// the cart is marked converted. Any failure rolls the whole thing
    /// back, so a failed checkout leaves no partial rows behind.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn checkout(&self, customer_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let cart = carts::active_cart_on(&txn, customer_id).await?;
        let items = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .all(&txn)
            .await?;
        if items.is_empty() {
            return Err(ServiceError::InvalidOperation("cart is empty".into()));
        }

        let mut deferred_events = Vec::new();
        let mut resolved: Vec<(dish::Model, i32)> = Vec::new();
        let mut total = Decimal::ZERO;

        for item in &items {
            let dish = dish::Entity::find_by_id(item.dish_id)
                .filter(dish::Column::IsAvailable.eq(true))
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("dish {} is no longer available", item.dish_id))
                })?;

            // Prepared units first, raw ingredients for the remainder.
            let taken = inventory::take_prepared_units(&txn, dish.id, item.quantity).await?;
            let remainder = item.quantity - taken;
            if remainder > 0 {
                let events = inventory::reserve_ingredients(
                    &txn,
                    &dish,
                    remainder,
                    Some(customer_id),
                    &format!("used for {} x{}", dish.name, remainder),
                )
                .await?;
                deferred_events.extend(events);
            }

            total += dish.price * Decimal::from(item.quantity);
            resolved.push((dish, item.quantity));
        }

        let account = user::Entity::find_by_id(customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("account not found".into()))?;

        let order_id = Uuid::new_v4();
        let order_row = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_order_number()),
            customer_id: Set(customer_id),
            status: Set(OrderStatus::Preparing),
            total_price: Set(total),
            notes: Set(String::new()),
            is_visible_to_customer: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let order_model = order_row.insert(&txn).await?;

        for (dish, quantity) in &resolved {
            let item_row = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                dish_id: Set(dish.id),
                quantity: Set(*quantity),
                price_at_time: Set(dish.price),
                status: Set(OrderItemStatus::Preparing),
            };
            item_row.insert(&txn).await?;
        }

        billing::debit_balance(
            &txn,
            account,
            total,
            TransactionKind::Payment,
            &format!("payment for order {}", order_model.order_number),
            Some(order_id),
        )
        .await?;

        let paid = billing::record_payment(
            &txn,
            customer_id,
            Some(order_id),
            total,
            PaymentMethod::Balance,
            &format!("payment for order {}", order_model.order_number),
        )
        .await?;

        carts::mark_converted(&txn, cart).await?;
        txn.commit().await?;

        for event in deferred_events {
            self.event_sender.send_or_log(event).await;
        }
        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;
        self.event_sender
            .send_or_log(Event::PaymentRecorded(paid.id))
            .await;
        info!(order_id = %order_id, total = %total, "order checked out");

        self.load_response(order_model).await
    }

    /// The customer's in-progress orders, newest first.
    pub async fn list_active(&self, customer_id: Uuid) -> Result<Vec<OrderResponse>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .filter(order::Column::IsVisibleToCustomer.eq(true))
            .filter(order::Column::Status.is_in([
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Preparing,
                OrderStatus::Ready,
            ]))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        self.load_responses(orders).await
    }

    /// Completed orders (picked up or delivered).
    pub async fn list_history(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .filter(order::Column::IsVisibleToCustomer.eq(true))
            .filter(
                order::Column::Status
                    .is_in([OrderStatus::PickedUp, OrderStatus::Delivered]),
            )
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        self.load_responses(orders).await
    }

    /// Single order; owner or staff only.
    pub async fn get(&self, order_id: Uuid, viewer: &AuthUser) -> Result<OrderResponse, ServiceError> {
        let order = self.find_order(order_id).await?;
        if order.customer_id != viewer.id && !viewer.role.can_view_all_orders() {
            return Err(ServiceError::Forbidden(
                "you cannot view this order".into(),
            ));
        }
        self.load_response(order).await
    }

    /// Orders waiting for the kitchen, oldest first.
    pub async fn kitchen_queue(&self) -> Result<Vec<OrderResponse>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::Status.eq(OrderStatus::Preparing))
            .order_by_asc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        self.load_responses(orders).await
    }

    /// Full order list for the admin screens, optionally by status.
    pub async fn admin_list(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let mut query = order::Entity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }
        let orders = query.all(&*self.db).await?;
        self.load_responses(orders).await
    }

    /// Status transition with per-role rules: chefs may only move
    /// `Preparing -> Ready`; admins may make any move the status machine
    /// allows.
    #[instrument(skip(self, actor), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        actor: &AuthUser,
    ) -> Result<OrderResponse, ServiceError> {
        if !actor.role.can_change_order_status() {
            return Err(ServiceError::Forbidden(
                "only staff can change order status".into(),
            ));
        }

        let order = self.find_order(order_id).await?;
        let old_status = order.status;

        let permitted = match actor.role {
            Role::Chef => old_status == OrderStatus::Preparing && new_status == OrderStatus::Ready,
            Role::Admin => old_status.can_transition_to(new_status),
            Role::Student => false,
        };
        if !permitted {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot move order from {} to {}",
                old_status, new_status
            )));
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;

        self.load_response(updated).await
    }

    /// Customer-initiated cancellation. Allowed while pending or preparing;
    /// prepared units consumed by the order go back on the shelf and the
    /// paid amount is refunded to the balance, all in one transaction.
    #[instrument(skip(self), fields(order_id = %order_id, customer_id = %customer_id))]
    pub async fn cancel(
        &self,
        order_id: Uuid,
        customer_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let order = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("order not found".into()))?;
        if order.customer_id != customer_id {
            return Err(ServiceError::Forbidden("not your order".into()));
        }
        if !order.status.is_cancellable() {
            return Err(ServiceError::InvalidOperation(format!(
                "order in status {} cannot be cancelled",
                order.status
            )));
        }

        let updated = cancel_in_txn(&txn, order).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderCancelled(order_id))
            .await;
        self.load_response(updated).await
    }

    /// Marks a ready order as collected and records the pickup.
    #[instrument(skip(self), fields(order_id = %order_id, customer_id = %customer_id))]
    pub async fn pickup(
        &self,
        order_id: Uuid,
        customer_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let order = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("order not found".into()))?;
        if order.customer_id != customer_id {
            return Err(ServiceError::Forbidden("not your order".into()));
        }
        if order.status != OrderStatus::Ready {
            return Err(ServiceError::InvalidOperation(
                "order is not ready for pickup".into(),
            ));
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::PickedUp);
        let updated = active.update(&txn).await?;

        let pickup = order_pickup::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            picked_up_at: Set(Utc::now()),
            picked_up_by: Set(Some(customer_id)),
        };
        pickup.insert(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderPickedUp(order_id))
            .await;
        self.load_response(updated).await
    }

    /// Hides an order from the customer's lists without deleting it.
    pub async fn hide(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let order = self.find_order(order_id).await?;
        let mut active: order::ActiveModel = order.into();
        active.is_visible_to_customer = Set(false);
        active.update(&*self.db).await?;
        Ok(())
    }

    async fn find_order(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("order not found".into()))
    }

    async fn load_responses(
        &self,
        orders: Vec<order::Model>,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let mut out = Vec::with_capacity(orders.len());
        for order in orders {
            out.push(self.load_response(order).await?);
        }
        Ok(out)
    }

    async fn load_response(&self, order: order::Model) -> Result<OrderResponse, ServiceError> {
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .find_also_related(dish::Entity)
            .all(&*self.db)
            .await?;

        Ok(OrderResponse {
            id: order.id,
            order_number: order.order_number,
            customer_id: order.customer_id,
            status: order.status,
            total_price: order.total_price,
            notes: order.notes,
            created_at: order.created_at,
            items: items
                .into_iter()
                .map(|(item, dish)| OrderItemResponse {
                    dish_id: item.dish_id,
                    dish_name: dish.map(|d| d.name).unwrap_or_default(),
                    quantity: item.quantity,
                    price_at_time: item.price_at_time,
                    line_total: item.line_total(),
                    status: item.status,
                })
                .collect(),
        })
    }
}

/// Cancels an order inside an existing transaction: restores prepared
/// units, refunds any paid balance payments and flips the status. Shared
/// with combo redemption cancellation.
pub async fn cancel_in_txn<C: ConnectionTrait>(
    conn: &C,
    order: order::Model,
) -> Result<order::Model, ServiceError> {
    let order_id = order.id;

    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(conn)
        .await?;
    for item in &items {
        inventory::restore_prepared_units(conn, item.dish_id, item.quantity).await?;
    }

    // Refund whatever was actually paid from the balance for this order.
    let paid: Decimal = payment::Entity::find()
        .filter(payment::Column::OrderId.eq(order_id))
        .filter(payment::Column::Status.eq(PaymentStatus::Paid))
        .filter(payment::Column::Method.eq(PaymentMethod::Balance))
        .all(conn)
        .await?
        .iter()
        .map(|p| p.amount)
        .sum();

    if paid > Decimal::ZERO {
        let account = user::Entity::find_by_id(order.customer_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("account not found".into()))?;
        billing::credit_balance(
            conn,
            account,
            paid,
            TransactionKind::Refund,
            &format!("refund for cancelled order {}", order.order_number),
            Some(order_id),
        )
        .await?;
    }

    let mut active: order::ActiveModel = order.into();
    active.status = Set(OrderStatus::Cancelled);
    Ok(active.update(conn).await?)
}

fn generate_order_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", &suffix[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_are_prefixed_and_unique() {
        let a = generate_order_number();
        let b = generate_order_number();
        assert!(a.starts_with("ORD-"));
        assert_eq!(a.len(), 12);
        assert_ne!(a, b);
    }
}
