use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only ledger of ingredient stock movements. Rows are never updated
/// or deleted; every mutation of `ingredient_stocks` writes one.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ingredient_id: Uuid,
    pub operation: StockOperation,
    /// Signed delta; negative for usage and waste.
    pub quantity_change: Decimal,
    pub quantity_before: Decimal,
    pub quantity_after: Decimal,
    /// Money value of the movement (quantity × cost per unit) when the
    /// ingredient is priced, zero otherwise.
    pub total_cost: Decimal,
    pub performed_by: Option<Uuid>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
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
pub enum StockOperation {
    /// Delivery added to the warehouse
    #[sea_orm(string_value = "restock")]
    Restock,
    /// Consumed by cooking
    #[sea_orm(string_value = "usage")]
    Usage,
    /// Manual correction to an absolute value
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
    /// Written off (spoilage, breakage)
    #[sea_orm(string_value = "waste")]
    Waste,
    /// Restock request; records intent, does not change quantity
    #[sea_orm(string_value = "request")]
    Request,
}
