use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ready-to-serve units of a dish, consumable without touching raw
/// ingredient stock. Cooking more units goes through ingredient
/// reservation first.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prepared_dishes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub dish_id: Uuid,
    pub quantity: i32,
    pub max_quantity: i32,
    pub prepared_at: DateTime<Utc>,
    pub prepared_by: Option<Uuid>,
}

impl Model {
    pub fn is_available(&self) -> bool {
        self.quantity > 0
    }

    /// The kitchen convention: below half the cap the chef should cook more.
    pub fn needs_preparation(&self) -> bool {
        self.quantity * 2 < self.max_quantity
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dish::Entity",
        from = "Column::DishId",
        to = "super::dish::Column::Id"
    )]
    Dish,
}

impl Related<super::dish::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dish.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared(quantity: i32, max_quantity: i32) -> Model {
        Model {
            id: Uuid::new_v4(),
            dish_id: Uuid::new_v4(),
            quantity,
            max_quantity,
            prepared_at: Utc::now(),
            prepared_by: None,
        }
    }

    #[test]
    fn availability_requires_at_least_one_unit() {
        assert!(prepared(1, 20).is_available());
        assert!(!prepared(0, 20).is_available());
    }

    #[test]
    fn needs_preparation_below_half_cap() {
        assert!(prepared(9, 20).needs_preparation());
        assert!(!prepared(10, 20).needs_preparation());
        assert!(!prepared(20, 20).needs_preparation());
    }
}
