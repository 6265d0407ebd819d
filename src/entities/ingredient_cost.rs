use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purchase cost per unit of an ingredient, used to price stock movements.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredient_costs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub ingredient_id: Uuid,
    pub cost_per_unit: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl Model {
    /// Total cost for `quantity` units, exact decimal arithmetic.
    pub fn calculate_total_cost(&self, quantity: Decimal) -> Decimal {
        self.cost_per_unit * quantity
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

    fn cost(per_unit: Decimal) -> Model {
        Model {
            id: Uuid::new_v4(),
            ingredient_id: Uuid::new_v4(),
            cost_per_unit: per_unit,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn total_cost_is_exact_decimal_arithmetic() {
        let c = cost(dec!(80.50));
        assert_eq!(c.calculate_total_cost(dec!(2)), dec!(161.00));
        assert_eq!(c.calculate_total_cost(dec!(1.5)), dec!(120.75));
        assert_eq!(c.calculate_total_cost(dec!(0)), dec!(0.00));
    }
}
