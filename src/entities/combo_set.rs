use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A prepaid bundle of dishes. The customer pays
/// `total_price × max_orders` once and then redeems the bundle as a fresh
/// order up to `max_orders` times.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "combo_sets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_by: Uuid,
    /// Price of a single redemption, not of the whole bundle.
    pub total_price: Decimal,
    pub max_orders: i32,
    pub orders_used: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// How many redemptions are left.
    pub fn remaining_orders(&self) -> i32 {
        (self.max_orders - self.orders_used).max(0)
    }

    pub fn is_available(&self) -> bool {
        self.is_active && self.remaining_orders() > 0
    }

    /// Amount paid up-front for the whole bundle.
    pub fn total_paid(&self) -> Decimal {
        self.total_price * Decimal::from(self.max_orders)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::combo_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::combo_order::Entity")]
    Redemptions,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Owner,
}

impl Related<super::combo_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::combo_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Redemptions.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn combo(max_orders: i32, orders_used: i32, price: Decimal) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "Lunch week".into(),
            description: String::new(),
            created_by: Uuid::new_v4(),
            total_price: price,
            max_orders,
            orders_used,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn remaining_orders_never_goes_negative() {
        assert_eq!(combo(5, 0, dec!(100)).remaining_orders(), 5);
        assert_eq!(combo(5, 5, dec!(100)).remaining_orders(), 0);
        assert_eq!(combo(5, 7, dec!(100)).remaining_orders(), 0);
    }

    #[test]
    fn remaining_hits_zero_exactly_at_exhaustion() {
        assert_eq!(combo(3, 2, dec!(100)).remaining_orders(), 1);
        assert_eq!(combo(3, 3, dec!(100)).remaining_orders(), 0);
    }

    #[test]
    fn total_paid_is_price_times_redemptions() {
        assert_eq!(combo(5, 0, dec!(1000.00)).total_paid(), dec!(5000.00));
        assert_eq!(combo(2, 1, dec!(150.25)).total_paid(), dec!(300.50));
    }

    #[test]
    fn availability_requires_active_and_remaining() {
        let mut c = combo(2, 2, dec!(100));
        assert!(!c.is_available());
        c.orders_used = 1;
        assert!(c.is_available());
        c.is_active = false;
        assert!(!c.is_available());
    }
}
