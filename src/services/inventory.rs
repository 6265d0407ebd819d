use crate::{
    entities::{
        dish, dish_ingredient, ingredient, ingredient_cost, ingredient_stock, prepared_dish,
        stock_history::{self, StockOperation},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// One unmet recipe requirement, as reported by availability checks.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MissingIngredient {
    pub ingredient_id: Uuid,
    pub name: String,
    pub required: Decimal,
    pub available: Decimal,
    pub missing: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityReport {
    pub dish_id: Uuid,
    pub quantity: i32,
    pub available: bool,
    pub missing: Vec<MissingIngredient>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockResponse {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub current_quantity: Decimal,
    pub min_quantity: Decimal,
    pub unit: String,
    pub is_low: bool,
    pub is_out_of_stock: bool,
}

/// Checks whether `quantity` units of the dish can be cooked from raw
/// ingredient stock. A missing stock row counts as zero on hand.
pub async fn check_dish_availability<C: ConnectionTrait>(
    conn: &C,
    dish_id: Uuid,
    quantity: i32,
) -> Result<AvailabilityReport, ServiceError> {
    let recipe = dish_ingredient::Entity::find()
        .filter(dish_ingredient::Column::DishId.eq(dish_id))
        .find_also_related(ingredient::Entity)
        .all(conn)
        .await?;

    let mut missing = Vec::new();
    for (line, ing) in &recipe {
        let required = line.quantity * Decimal::from(quantity);
        let on_hand = ingredient_stock::Entity::find()
            .filter(ingredient_stock::Column::IngredientId.eq(line.ingredient_id))
            .one(conn)
            .await?
            .map(|s| s.current_quantity)
            .unwrap_or(Decimal::ZERO);

        if on_hand < required {
            missing.push(MissingIngredient {
                ingredient_id: line.ingredient_id,
                name: ing.as_ref().map(|i| i.name.clone()).unwrap_or_default(),
                required,
                available: on_hand,
                missing: required - on_hand,
            });
        }
    }

    Ok(AvailabilityReport {
        dish_id,
        quantity,
        available: missing.is_empty(),
        missing,
    })
}

/// Reserves raw ingredients for cooking `quantity` units of `dish`: each
/// recipe line's stock is decremented and one `usage` ledger row appended.
/// Runs inside the caller's transaction; fails (and therefore rolls the
/// caller back) rather than driving any stock below zero.
///
/// Returns the events to emit once the surrounding transaction commits.
pub async fn reserve_ingredients<C: ConnectionTrait>(
    conn: &C,
    dish: &dish::Model,
    quantity: i32,
    performed_by: Option<Uuid>,
    notes: &str,
) -> Result<Vec<Event>, ServiceError> {
    let report = check_dish_availability(conn, dish.id, quantity).await?;
    if !report.available {
        let names: Vec<String> = report.missing.iter().map(|m| m.name.clone()).collect();
        return Err(ServiceError::InsufficientStock(format!(
            "not enough {} for {} x{}",
            names.join(", "),
            dish.name,
            quantity
        )));
    }

    let recipe = dish_ingredient::Entity::find()
        .filter(dish_ingredient::Column::DishId.eq(dish.id))
        .all(conn)
        .await?;

    let mut events = Vec::new();
    for line in recipe {
        let required = line.quantity * Decimal::from(quantity);
        let stock = ingredient_stock::Entity::find()
            .filter(ingredient_stock::Column::IngredientId.eq(line.ingredient_id))
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::InsufficientStock(format!(
                    "no stock record for ingredient {}",
                    line.ingredient_id
                ))
            })?;

        let before = stock.current_quantity;
        let after = before - required;
        if after < Decimal::ZERO {
            return Err(ServiceError::InsufficientStock(format!(
                "stock for ingredient {} would go negative",
                line.ingredient_id
            )));
        }

        let min_quantity = stock.min_quantity;
        let mut active: ingredient_stock::ActiveModel = stock.into();
        active.current_quantity = Set(after);
        active.update(conn).await?;

        append_history(
            conn,
            line.ingredient_id,
            StockOperation::Usage,
            -required,
            before,
            after,
            performed_by,
            notes,
        )
        .await?;

        events.push(Event::StockReserved {
            ingredient_id: line.ingredient_id,
            quantity: required,
        });
        if after <= min_quantity {
            events.push(Event::LowStockDetected {
                ingredient_id: line.ingredient_id,
                current_quantity: after,
                min_quantity,
            });
        }
    }

    Ok(events)
}

/// Serves up to `want` units of the dish from prepared rows, oldest first.
/// Returns how many units were actually taken.
pub async fn take_prepared_units<C: ConnectionTrait>(
    conn: &C,
    dish_id: Uuid,
    want: i32,
) -> Result<i32, ServiceError> {
    let rows = prepared_dish::Entity::find()
        .filter(prepared_dish::Column::DishId.eq(dish_id))
        .order_by_asc(prepared_dish::Column::PreparedAt)
        .all(conn)
        .await?;

    let mut remaining = want;
    for row in rows {
        if remaining == 0 {
            break;
        }
        let take = row.quantity.min(remaining);
        if take == 0 {
            continue;
        }
        let quantity = row.quantity;
        let mut active: prepared_dish::ActiveModel = row.into();
        active.quantity = Set(quantity - take);
        active.update(conn).await?;
        remaining -= take;
    }

    Ok(want - remaining)
}

/// Puts units back on prepared rows after a cancellation, capped at each
/// row's `max_quantity`. Compensation is best-effort: units that no longer
/// fit under the caps are dropped.
pub async fn restore_prepared_units<C: ConnectionTrait>(
    conn: &C,
    dish_id: Uuid,
    quantity: i32,
) -> Result<i32, ServiceError> {
    let rows = prepared_dish::Entity::find()
        .filter(prepared_dish::Column::DishId.eq(dish_id))
        .order_by_asc(prepared_dish::Column::PreparedAt)
        .all(conn)
        .await?;

    let mut remaining = quantity;
    for row in rows {
        if remaining == 0 {
            break;
        }
        let headroom = (row.max_quantity - row.quantity).max(0);
        let put = headroom.min(remaining);
        if put == 0 {
            continue;
        }
        let current = row.quantity;
        let mut active: prepared_dish::ActiveModel = row.into();
        active.quantity = Set(current + put);
        active.update(conn).await?;
        remaining -= put;
    }

    Ok(quantity - remaining)
}

#[allow(clippy::too_many_arguments)]
async fn append_history<C: ConnectionTrait>(
    conn: &C,
    ingredient_id: Uuid,
    operation: StockOperation,
    change: Decimal,
    before: Decimal,
    after: Decimal,
    performed_by: Option<Uuid>,
    notes: &str,
) -> Result<stock_history::Model, ServiceError> {
    let total_cost = ingredient_cost::Entity::find()
        .filter(ingredient_cost::Column::IngredientId.eq(ingredient_id))
        .one(conn)
        .await?
        .map(|c| c.calculate_total_cost(change.abs()))
        .unwrap_or(Decimal::ZERO);

    let row = stock_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        ingredient_id: Set(ingredient_id),
        operation: Set(operation),
        quantity_change: Set(change),
        quantity_before: Set(before),
        quantity_after: Set(after),
        total_cost: Set(total_cost),
        performed_by: Set(performed_by),
        notes: Set(notes.to_string()),
        created_at: Set(Utc::now()),
    };
    Ok(row.insert(conn).await?)
}

/// Warehouse bookkeeping: stock levels, the movement ledger and prepared
/// dish management.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_stocks(&self, low_only: bool) -> Result<Vec<StockResponse>, ServiceError> {
        let rows = ingredient_stock::Entity::find()
            .find_also_related(ingredient::Entity)
            .all(&*self.db)
            .await?;

        let mut out: Vec<StockResponse> = rows
            .into_iter()
            .map(|(stock, ing)| StockResponse {
                ingredient_id: stock.ingredient_id,
                ingredient_name: ing.map(|i| i.name).unwrap_or_default(),
                is_low: stock.is_low(),
                is_out_of_stock: stock.is_out_of_stock(),
                current_quantity: stock.current_quantity,
                min_quantity: stock.min_quantity,
                unit: stock.unit,
            })
            .collect();

        if low_only {
            out.retain(|s| s.is_low);
        }
        out.sort_by(|a, b| a.ingredient_name.cmp(&b.ingredient_name));
        Ok(out)
    }

    /// Availability check against the live stock, outside any transaction.
    pub async fn check_availability(
        &self,
        dish_id: Uuid,
        quantity: i32,
    ) -> Result<AvailabilityReport, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::InvalidInput(
                "quantity must be at least 1".into(),
            ));
        }
        check_dish_availability(&*self.db, dish_id, quantity).await
    }

    /// Adds a delivery to the warehouse, creating the stock row on first
    /// restock of an ingredient.
    #[instrument(skip(self), fields(ingredient_id = %ingredient_id, quantity = %quantity))]
    pub async fn restock(
        &self,
        ingredient_id: Uuid,
        quantity: Decimal,
        performed_by: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<StockResponse, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "restock quantity must be positive".into(),
            ));
        }

        let txn = self.db.begin().await?;

        let ing = ingredient::Entity::find_by_id(ingredient_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("ingredient not found".into()))?;

        let existing = ingredient_stock::Entity::find()
            .filter(ingredient_stock::Column::IngredientId.eq(ingredient_id))
            .one(&txn)
            .await?;

        let (before, stock) = match existing {
            Some(stock) => {
                let before = stock.current_quantity;
                let after = before + quantity;
                let mut active: ingredient_stock::ActiveModel = stock.into();
                active.current_quantity = Set(after);
                active.last_restocked = Set(Utc::now());
                (before, active.update(&txn).await?)
            }
            None => {
                let row = ingredient_stock::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    ingredient_id: Set(ingredient_id),
                    current_quantity: Set(quantity),
                    min_quantity: Set(Decimal::from(10)),
                    unit: Set(ing.unit.clone()),
                    last_restocked: Set(Utc::now()),
                };
                (Decimal::ZERO, row.insert(&txn).await?)
            }
        };

        append_history(
            &txn,
            ingredient_id,
            StockOperation::Restock,
            quantity,
            before,
            stock.current_quantity,
            performed_by,
            notes.as_deref().unwrap_or("restock"),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::StockRestocked {
                ingredient_id,
                quantity,
            })
            .await;
        info!(ingredient = %ing.name, "stock replenished");

        Ok(StockResponse {
            ingredient_id,
            ingredient_name: ing.name,
            is_low: stock.is_low(),
            is_out_of_stock: stock.is_out_of_stock(),
            current_quantity: stock.current_quantity,
            min_quantity: stock.min_quantity,
            unit: stock.unit,
        })
    }

    /// Sets the stock to an absolute value, recording the signed delta.
    #[instrument(skip(self), fields(ingredient_id = %ingredient_id))]
    pub async fn adjust(
        &self,
        ingredient_id: Uuid,
        new_quantity: Decimal,
        performed_by: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<StockResponse, ServiceError> {
        if new_quantity < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "stock cannot be set below zero".into(),
            ));
        }

        let txn = self.db.begin().await?;
        let (stock, ing) = self.stock_with_ingredient(&txn, ingredient_id).await?;

        let before = stock.current_quantity;
        let mut active: ingredient_stock::ActiveModel = stock.into();
        active.current_quantity = Set(new_quantity);
        let updated = active.update(&txn).await?;

        append_history(
            &txn,
            ingredient_id,
            StockOperation::Adjustment,
            new_quantity - before,
            before,
            new_quantity,
            performed_by,
            notes.as_deref().unwrap_or("manual adjustment"),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::StockAdjusted {
                ingredient_id,
                old_quantity: before,
                new_quantity,
            })
            .await;

        Ok(StockResponse {
            ingredient_id,
            ingredient_name: ing.name,
            is_low: updated.is_low(),
            is_out_of_stock: updated.is_out_of_stock(),
            current_quantity: updated.current_quantity,
            min_quantity: updated.min_quantity,
            unit: updated.unit,
        })
    }

    /// Writes stock off (spoilage). Never drives the level below zero.
    #[instrument(skip(self), fields(ingredient_id = %ingredient_id, quantity = %quantity))]
    pub async fn waste(
        &self,
        ingredient_id: Uuid,
        quantity: Decimal,
        performed_by: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<StockResponse, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "waste quantity must be positive".into(),
            ));
        }

        let txn = self.db.begin().await?;
        let (stock, ing) = self.stock_with_ingredient(&txn, ingredient_id).await?;

        let before = stock.current_quantity;
        let after = before - quantity;
        if after < Decimal::ZERO {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot write off {} {}: only {} on hand",
                quantity, stock.unit, before
            )));
        }

        let mut active: ingredient_stock::ActiveModel = stock.into();
        active.current_quantity = Set(after);
        let updated = active.update(&txn).await?;

        append_history(
            &txn,
            ingredient_id,
            StockOperation::Waste,
            -quantity,
            before,
            after,
            performed_by,
            notes.as_deref().unwrap_or("written off"),
        )
        .await?;

        txn.commit().await?;

        Ok(StockResponse {
            ingredient_id,
            ingredient_name: ing.name,
            is_low: updated.is_low(),
            is_out_of_stock: updated.is_out_of_stock(),
            current_quantity: updated.current_quantity,
            min_quantity: updated.min_quantity,
            unit: updated.unit,
        })
    }

    /// Records a restock request in the ledger without touching quantities.
    pub async fn request_restock(
        &self,
        ingredient_id: Uuid,
        quantity: Decimal,
        performed_by: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<(), ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "requested quantity must be positive".into(),
            ));
        }

        let txn = self.db.begin().await?;
        let (stock, _) = self.stock_with_ingredient(&txn, ingredient_id).await?;
        let current = stock.current_quantity;

        append_history(
            &txn,
            ingredient_id,
            StockOperation::Request,
            quantity,
            current,
            current,
            performed_by,
            notes.as_deref().unwrap_or("restock requested"),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    pub async fn history(
        &self,
        ingredient_id: Option<Uuid>,
    ) -> Result<Vec<stock_history::Model>, ServiceError> {
        let mut query = stock_history::Entity::find()
            .order_by_desc(stock_history::Column::CreatedAt);
        if let Some(id) = ingredient_id {
            query = query.filter(stock_history::Column::IngredientId.eq(id));
        }
        Ok(query.all(&*self.db).await?)
    }

    /// Upserts the purchase cost per unit for an ingredient.
    pub async fn set_cost(
        &self,
        ingredient_id: Uuid,
        cost_per_unit: Decimal,
    ) -> Result<ingredient_cost::Model, ServiceError> {
        if cost_per_unit < Decimal::ZERO {
            return Err(ServiceError::InvalidInput("cost cannot be negative".into()));
        }

        let existing = ingredient_cost::Entity::find()
            .filter(ingredient_cost::Column::IngredientId.eq(ingredient_id))
            .one(&*self.db)
            .await?;

        let updated = match existing {
            Some(cost) => {
                let mut active: ingredient_cost::ActiveModel = cost.into();
                active.cost_per_unit = Set(cost_per_unit);
                active.last_updated = Set(Utc::now());
                active.update(&*self.db).await?
            }
            None => {
                ingredient::Entity::find_by_id(ingredient_id)
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("ingredient not found".into()))?;
                let row = ingredient_cost::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    ingredient_id: Set(ingredient_id),
                    cost_per_unit: Set(cost_per_unit),
                    last_updated: Set(Utc::now()),
                };
                row.insert(&*self.db).await?
            }
        };
        Ok(updated)
    }

    pub async fn list_prepared(&self) -> Result<Vec<prepared_dish::Model>, ServiceError> {
        Ok(prepared_dish::Entity::find()
            .order_by_asc(prepared_dish::Column::DishId)
            .all(&*self.db)
            .await?)
    }

    /// Cooks `quantity` more units of a dish: reserves the raw ingredients
    /// and adds the units to the dish's prepared row (created on first use).
    /// The whole operation is one transaction.
    #[instrument(skip(self), fields(dish_id = %dish_id, quantity = quantity))]
    pub async fn prepare_dish(
        &self,
        dish_id: Uuid,
        quantity: i32,
        chef_id: Uuid,
    ) -> Result<prepared_dish::Model, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::InvalidInput(
                "quantity must be at least 1".into(),
            ));
        }

        let txn = self.db.begin().await?;

        let dish = dish::Entity::find_by_id(dish_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("dish not found".into()))?;

        let events = reserve_ingredients(
            &txn,
            &dish,
            quantity,
            Some(chef_id),
            &format!("cooked {} x{}", dish.name, quantity),
        )
        .await?;

        let existing = prepared_dish::Entity::find()
            .filter(prepared_dish::Column::DishId.eq(dish_id))
            .order_by_asc(prepared_dish::Column::PreparedAt)
            .one(&txn)
            .await?;

        let updated = match existing {
            Some(row) => {
                let new_quantity = row.quantity + quantity;
                if new_quantity > row.max_quantity {
                    return Err(ServiceError::InvalidOperation(format!(
                        "prepared cap exceeded: {} + {} > {}",
                        row.quantity, quantity, row.max_quantity
                    )));
                }
                let mut active: prepared_dish::ActiveModel = row.into();
                active.quantity = Set(new_quantity);
                active.prepared_at = Set(Utc::now());
                active.prepared_by = Set(Some(chef_id));
                active.update(&txn).await?
            }
            None => {
                let default_cap = 20;
                if quantity > default_cap {
                    return Err(ServiceError::InvalidOperation(format!(
                        "prepared cap exceeded: {} > {}",
                        quantity, default_cap
                    )));
                }
                let row = prepared_dish::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    dish_id: Set(dish_id),
                    quantity: Set(quantity),
                    max_quantity: Set(default_cap),
                    prepared_at: Set(Utc::now()),
                    prepared_by: Set(Some(chef_id)),
                };
                row.insert(&txn).await?
            }
        };

        txn.commit().await?;

        for event in events {
            self.event_sender.send_or_log(event).await;
        }
        self.event_sender
            .send_or_log(Event::DishPrepared { dish_id, quantity })
            .await;

        Ok(updated)
    }

    pub async fn set_prepared_max(
        &self,
        prepared_id: Uuid,
        max_quantity: i32,
    ) -> Result<prepared_dish::Model, ServiceError> {
        if max_quantity < 1 {
            return Err(ServiceError::InvalidInput(
                "max quantity must be at least 1".into(),
            ));
        }
        let row = prepared_dish::Entity::find_by_id(prepared_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("prepared dish not found".into()))?;
        if row.quantity > max_quantity {
            return Err(ServiceError::InvalidOperation(format!(
                "{} units already prepared, cap cannot be {}",
                row.quantity, max_quantity
            )));
        }
        let mut active: prepared_dish::ActiveModel = row.into();
        active.max_quantity = Set(max_quantity);
        Ok(active.update(&*self.db).await?)
    }

    async fn stock_with_ingredient<C: ConnectionTrait>(
        &self,
        conn: &C,
        ingredient_id: Uuid,
    ) -> Result<(ingredient_stock::Model, ingredient::Model), ServiceError> {
        let ing = ingredient::Entity::find_by_id(ingredient_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("ingredient not found".into()))?;
        let stock = ingredient_stock::Entity::find()
            .filter(ingredient_stock::Column::IngredientId.eq(ingredient_id))
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("no stock record for {}", ing.name))
            })?;
        Ok((stock, ing))
    }
}
