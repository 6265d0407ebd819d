use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A raw product used in dish recipes. `unit` is the unit of measure the
/// stock is tracked in (g, ml, pcs).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub unit: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::ingredient_stock::Entity")]
    Stock,
    #[sea_orm(has_one = "super::ingredient_cost::Entity")]
    Cost,
    #[sea_orm(has_many = "super::dish_ingredient::Entity")]
    DishIngredients,
    #[sea_orm(has_many = "super::stock_history::Entity")]
    StockHistory,
}

impl Related<super::ingredient_stock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stock.def()
    }
}

impl Related<super::ingredient_cost::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cost.def()
    }
}

impl Related<super::dish_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DishIngredients.def()
    }
}

impl Related<super::stock_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
