use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub notes: String,
    /// Hidden orders stay in the database for accounting but disappear from
    /// the customer's lists.
    pub is_visible_to_customer: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
    #[sea_orm(has_one = "super::order_pickup::Entity")]
    Pickup,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CustomerId",
        to = "super::user::Column::Id"
    )]
    Customer,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::order_pickup::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pickup.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if !insert {
            if let ActiveValue::NotSet = active_model.updated_at {
                active_model.updated_at = Set(Some(Utc::now()));
            }
        }
        Ok(active_model)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "preparing")]
    Preparing,
    #[sea_orm(string_value = "ready")]
    Ready,
    #[sea_orm(string_value = "picked_up")]
    PickedUp,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::PickedUp | OrderStatus::Delivered | OrderStatus::Cancelled
        )
    }

    /// Statuses counted as "in progress" for the customer's active list.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            OrderStatus::Pending
                | OrderStatus::Confirmed
                | OrderStatus::Preparing
                | OrderStatus::Ready
        )
    }

    /// The customer may abort an order before the kitchen finishes it.
    pub fn is_cancellable(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Preparing)
    }

    /// The full transition table. Admin moves are validated against this;
    /// chefs are further restricted to `Preparing -> Ready`.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed | Preparing | Cancelled)
                | (Confirmed, Preparing | Cancelled)
                | (Preparing, Ready | Cancelled)
                | (Ready, PickedUp | Delivered)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::{self, *};
    use sea_orm::Iterable;

    #[test]
    fn terminal_states_admit_no_transition() {
        for terminal in [PickedUp, Delivered, Cancelled] {
            for next in OrderStatus::iter() {
                assert!(
                    !terminal.can_transition_to(next),
                    "{terminal} -> {next} should be rejected"
                );
            }
        }
    }

    #[test]
    fn kitchen_path_is_permitted() {
        assert!(Pending.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(PickedUp));
        assert!(Ready.can_transition_to(Delivered));
    }

    #[test]
    fn no_skipping_straight_to_completion() {
        assert!(!Pending.can_transition_to(Ready));
        assert!(!Preparing.can_transition_to(PickedUp));
        assert!(!Ready.can_transition_to(Cancelled));
    }

    #[test]
    fn cancellable_only_before_ready() {
        assert!(Pending.is_cancellable());
        assert!(Preparing.is_cancellable());
        assert!(!Ready.is_cancellable());
        assert!(!Cancelled.is_cancellable());
    }
}
