use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Warehouse quantity for one ingredient. One row per ingredient.
///
/// `current_quantity` is only ever mutated inside a database transaction
/// together with a matching `stock_history` row; reservation paths fail
/// instead of driving it below zero.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredient_stocks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub ingredient_id: Uuid,
    pub current_quantity: Decimal,
    pub min_quantity: Decimal,
    pub unit: String,
    pub last_restocked: DateTime<Utc>,
}

impl Model {
    pub fn is_low(&self) -> bool {
        self.current_quantity <= self.min_quantity
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.current_quantity <= Decimal::ZERO
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ingredient::Entity",
        from = "Column::IngredientId",
        to = "super::ingredient::Column::Id"
    )]
    Ingredient,
}

impl Related<super::ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stock(current: Decimal, min: Decimal) -> Model {
        Model {
            id: Uuid::new_v4(),
            ingredient_id: Uuid::new_v4(),
            current_quantity: current,
            min_quantity: min,
            unit: "g".into(),
            last_restocked: Utc::now(),
        }
    }

    #[test]
    fn low_stock_includes_the_threshold_itself() {
        assert!(stock(dec!(10.00), dec!(10.00)).is_low());
        assert!(stock(dec!(9.99), dec!(10.00)).is_low());
        assert!(!stock(dec!(10.01), dec!(10.00)).is_low());
    }

    #[test]
    fn out_of_stock_at_zero_or_below() {
        assert!(stock(dec!(0.00), dec!(10.00)).is_out_of_stock());
        assert!(!stock(dec!(0.01), dec!(10.00)).is_out_of_stock());
    }
}
