use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub balance: Decimal,
    pub bonus_points: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn can_afford(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    #[sea_orm(has_many = "super::balance_transaction::Entity")]
    BalanceTransactions,
    #[sea_orm(has_many = "super::user_allergen::Entity")]
    Allergens,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::balance_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BalanceTransactions.def()
    }
}

impl Related<super::user_allergen::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allergens.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        } else {
            active_model.updated_at = Set(Some(now));
        }
        Ok(active_model)
    }
}

/// Closed set of account roles. Every permission in the API is derived from
/// these capability methods rather than from per-handler attribute checks.
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
    strum::EnumString,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "chef")]
    Chef,
    #[sea_orm(string_value = "student")]
    Student,
}

impl Role {
    /// Carts (and therefore checkout) are a student-only surface.
    pub fn can_use_cart(self) -> bool {
        matches!(self, Role::Student)
    }

    pub fn can_order_dishes(self) -> bool {
        matches!(self, Role::Student | Role::Admin)
    }

    pub fn can_view_all_orders(self) -> bool {
        matches!(self, Role::Admin | Role::Chef)
    }

    pub fn can_change_order_status(self) -> bool {
        matches!(self, Role::Admin | Role::Chef)
    }

    pub fn can_manage_catalog(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_manage_inventory(self) -> bool {
        matches!(self, Role::Admin | Role::Chef)
    }

    pub fn can_manage_users(self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_table_is_closed_per_role() {
        assert!(Role::Student.can_use_cart());
        assert!(!Role::Chef.can_use_cart());
        assert!(!Role::Admin.can_use_cart());

        assert!(Role::Chef.can_change_order_status());
        assert!(Role::Admin.can_change_order_status());
        assert!(!Role::Student.can_change_order_status());

        assert!(Role::Admin.can_manage_catalog());
        assert!(!Role::Chef.can_manage_catalog());

        assert!(Role::Chef.can_manage_inventory());
        assert!(!Role::Student.can_manage_inventory());
    }

    #[test]
    fn role_round_trips_through_strings() {
        use std::str::FromStr;
        assert_eq!(Role::from_str("chef").unwrap(), Role::Chef);
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
