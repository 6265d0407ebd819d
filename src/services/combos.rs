use crate::{
    entities::{
        balance_transaction::TransactionKind,
        combo_item, combo_order,
        combo_order::ComboOrderStatus,
        combo_set, dish,
        order::{self, OrderStatus},
        order_item::{self, OrderItemStatus},
        payment::PaymentMethod,
        user,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{billing, inventory, orders},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const MAX_COMBO_REPEATS: i32 = 100;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateComboRequest {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// How many times the bundle can be redeemed.
    pub max_orders: i32,
    pub items: Vec<ComboItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ComboItemRequest {
    pub dish_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComboItemResponse {
    pub dish_id: Uuid,
    pub dish_name: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComboSetResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub total_price: Decimal,
    pub max_orders: i32,
    pub orders_used: i32,
    pub remaining_orders: i32,
    pub total_paid: Decimal,
    pub is_active: bool,
    pub items: Vec<ComboItemResponse>,
}

/// Prepaid combo bundles: purchase, redemption and compensation.
#[derive(Clone)]
pub struct ComboService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ComboService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Buys a bundle: the full price (`single price × max_orders`) is paid
    /// up-front from the balance. Bundle, items, debit, ledger row and
    /// payment record commit atomically.
    #[instrument(skip(self, request), fields(customer_id = %customer_id, name = %request.name))]
    pub async fn create(
        &self,
        customer_id: Uuid,
        request: CreateComboRequest,
    ) -> Result<ComboSetResponse, ServiceError> {
        request.validate()?;
        if request.max_orders < 1 || request.max_orders > MAX_COMBO_REPEATS {
            return Err(ServiceError::InvalidInput(format!(
                "repeat count must be between 1 and {}",
                MAX_COMBO_REPEATS
            )));
        }
        if request.items.is_empty() {
            return Err(ServiceError::InvalidInput(
                "a combo needs at least one dish".into(),
            ));
        }
        if request.items.iter().any(|i| i.quantity < 1) {
            return Err(ServiceError::InvalidInput(
                "item quantities must be at least 1".into(),
            ));
        }

        let txn = self.db.begin().await?;

        // Price of one redemption at current dish prices.
        let mut single_price = Decimal::ZERO;
        let mut resolved = Vec::new();
        for item in &request.items {
            let dish = dish::Entity::find_by_id(item.dish_id)
                .filter(dish::Column::IsAvailable.eq(true))
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("dish {} not found or unavailable", item.dish_id))
                })?;
            single_price += dish.price * Decimal::from(item.quantity);
            resolved.push((dish, item.quantity));
        }

        let total = single_price * Decimal::from(request.max_orders);

        let account = user::Entity::find_by_id(customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("account not found".into()))?;

        let combo_id = Uuid::new_v4();
        let combo_row = combo_set::ActiveModel {
            id: Set(combo_id),
            name: Set(request.name.clone()),
            description: Set(request.description.clone()),
            created_by: Set(customer_id),
            total_price: Set(single_price),
            max_orders: Set(request.max_orders),
            orders_used: Set(0),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        };
        let combo = combo_row.insert(&txn).await?;

        for (dish, quantity) in &resolved {
            let item_row = combo_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                combo_set_id: Set(combo_id),
                dish_id: Set(dish.id),
                quantity: Set(*quantity),
            };
            item_row.insert(&txn).await?;
        }

        let description = format!(
            "combo '{}' prepaid ({} redemptions at {})",
            request.name, request.max_orders, single_price
        );
        billing::debit_balance(
            &txn,
            account,
            total,
            TransactionKind::Payment,
            &description,
            None,
        )
        .await?;
        billing::record_payment(
            &txn,
            customer_id,
            None,
            total,
            PaymentMethod::Balance,
            &description,
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ComboPurchased(combo_id))
            .await;
        info!(combo_id = %combo_id, total = %total, "combo purchased");

        self.load_response(combo).await
    }

    /// The customer's still-usable bundles.
    pub async fn my_sets(&self, customer_id: Uuid) -> Result<Vec<ComboSetResponse>, ServiceError> {
        let sets = combo_set::Entity::find()
            .filter(combo_set::Column::CreatedBy.eq(customer_id))
            .order_by_desc(combo_set::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut out = Vec::new();
        for set in sets {
            if set.is_active || set.orders_used < set.max_orders {
                out.push(self.load_response(set).await?);
            }
        }
        Ok(out)
    }

    /// Redeems one use of the bundle: creates the redemption record plus a
    /// real kitchen order, consumes prepared units where available and
    /// bumps the usage counter (deactivating the set on the last use).
    #[instrument(skip(self), fields(combo_id = %combo_id, customer_id = %customer_id))]
    pub async fn redeem(
        &self,
        combo_id: Uuid,
        customer_id: Uuid,
    ) -> Result<combo_order::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let set = combo_set::Entity::find_by_id(combo_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("combo set not found".into()))?;

        if set.created_by != customer_id {
            return Err(ServiceError::Forbidden(
                "you can only redeem your own combo sets".into(),
            ));
        }
        if !set.is_available() {
            return Err(ServiceError::InvalidOperation(
                "combo set is exhausted or inactive".into(),
            ));
        }

        let items = combo_item::Entity::find()
            .filter(combo_item::Column::ComboSetId.eq(combo_id))
            .all(&txn)
            .await?;

        // The kitchen order mirrors the bundle at current dish prices.
        let order_id = Uuid::new_v4();
        let order_row = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(format!("CMB-{}", &Uuid::new_v4().simple().to_string()[..8].to_uppercase())),
            customer_id: Set(customer_id),
            status: Set(OrderStatus::Preparing),
            total_price: Set(set.total_price),
            notes: Set(format!("combo set: {}", set.name)),
            is_visible_to_customer: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        order_row.insert(&txn).await?;

        for item in &items {
            let dish = dish::Entity::find_by_id(item.dish_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("combo dish no longer exists".into()))?;

            let item_row = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                dish_id: Set(item.dish_id),
                quantity: Set(item.quantity),
                price_at_time: Set(dish.price),
                status: Set(OrderItemStatus::Preparing),
            };
            item_row.insert(&txn).await?;

            // Serve from the shelf where possible; the kitchen cooks the rest.
            inventory::take_prepared_units(&txn, item.dish_id, item.quantity).await?;
        }

        let redemption_row = combo_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            combo_set_id: Set(combo_id),
            customer_id: Set(customer_id),
            status: Set(ComboOrderStatus::Preparing),
            main_order_id: Set(Some(order_id)),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let redemption = redemption_row.insert(&txn).await?;

        // increment_usage: deactivate once the last redemption is used.
        let orders_used = set.orders_used + 1;
        let exhausted = orders_used >= set.max_orders;
        let mut active: combo_set::ActiveModel = set.into();
        active.orders_used = Set(orders_used);
        if exhausted {
            active.is_active = Set(false);
        }
        active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ComboRedeemed {
                combo_set_id: combo_id,
                order_id,
            })
            .await;

        Ok(redemption)
    }

    /// Cancels a redemption that the kitchen has not finished: the linked
    /// order is cancelled (restoring prepared units), and the usage counter
    /// steps back down, reactivating the set if it was exhausted. The
    /// bundle itself stays paid.
    #[instrument(skip(self), fields(redemption_id = %redemption_id, customer_id = %customer_id))]
    pub async fn cancel_redemption(
        &self,
        redemption_id: Uuid,
        customer_id: Uuid,
    ) -> Result<combo_order::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let redemption = combo_order::Entity::find_by_id(redemption_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("combo order not found".into()))?;
        if redemption.customer_id != customer_id {
            return Err(ServiceError::Forbidden("not your combo order".into()));
        }
        if redemption.status != ComboOrderStatus::Preparing {
            return Err(ServiceError::InvalidOperation(format!(
                "combo order in status {:?} cannot be cancelled",
                redemption.status
            )));
        }

        if let Some(main_order_id) = redemption.main_order_id {
            let main_order = order::Entity::find_by_id(main_order_id).one(&txn).await?;
            if let Some(main_order) = main_order {
                if !main_order.status.is_terminal() {
                    orders::cancel_in_txn(&txn, main_order).await?;
                }
            }
        }

        // decrement_usage: step the counter back and reactivate.
        let set = combo_set::Entity::find_by_id(redemption.combo_set_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("combo set not found".into()))?;
        let orders_used = (set.orders_used - 1).max(0);
        let mut set_active: combo_set::ActiveModel = set.into();
        set_active.orders_used = Set(orders_used);
        set_active.is_active = Set(true);
        set_active.update(&txn).await?;

        let mut active: combo_order::ActiveModel = redemption.into();
        active.status = Set(ComboOrderStatus::Cancelled);
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ComboRedemptionCancelled(redemption_id))
            .await;

        Ok(updated)
    }

    pub async fn my_redemptions(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<combo_order::Model>, ServiceError> {
        Ok(combo_order::Entity::find()
            .filter(combo_order::Column::CustomerId.eq(customer_id))
            .order_by_desc(combo_order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Redemptions waiting for the kitchen, oldest first.
    pub async fn kitchen_queue(&self) -> Result<Vec<combo_order::Model>, ServiceError> {
        Ok(combo_order::Entity::find()
            .filter(combo_order::Column::Status.eq(ComboOrderStatus::Preparing))
            .order_by_asc(combo_order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Chef toggling between preparing and ready.
    pub async fn update_redemption_status(
        &self,
        redemption_id: Uuid,
        new_status: ComboOrderStatus,
    ) -> Result<combo_order::Model, ServiceError> {
        if !matches!(
            new_status,
            ComboOrderStatus::Preparing | ComboOrderStatus::Ready
        ) {
            return Err(ServiceError::InvalidOperation(
                "chefs can only set preparing or ready".into(),
            ));
        }

        let redemption = combo_order::Entity::find_by_id(redemption_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("combo order not found".into()))?;

        if matches!(
            redemption.status,
            ComboOrderStatus::PickedUp | ComboOrderStatus::Cancelled
        ) {
            return Err(ServiceError::InvalidOperation(
                "combo order is already finished".into(),
            ));
        }

        let mut active: combo_order::ActiveModel = redemption.into();
        active.status = Set(new_status);
        Ok(active.update(&*self.db).await?)
    }

    async fn load_response(
        &self,
        set: combo_set::Model,
    ) -> Result<ComboSetResponse, ServiceError> {
        let items = combo_item::Entity::find()
            .filter(combo_item::Column::ComboSetId.eq(set.id))
            .find_also_related(dish::Entity)
            .all(&*self.db)
            .await?;

        Ok(ComboSetResponse {
            id: set.id,
            name: set.name.clone(),
            description: set.description.clone(),
            total_price: set.total_price,
            max_orders: set.max_orders,
            orders_used: set.orders_used,
            remaining_orders: set.remaining_orders(),
            total_paid: set.total_paid(),
            is_active: set.is_active,
            items: items
                .into_iter()
                .map(|(item, dish)| ComboItemResponse {
                    dish_id: item.dish_id,
                    dish_name: dish.map(|d| d.name).unwrap_or_default(),
                    quantity: item.quantity,
                })
                .collect(),
        })
    }
}
