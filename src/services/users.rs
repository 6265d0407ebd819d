use crate::{
    entities::{
        order::{self, OrderStatus},
        order_pickup,
        payment::{self, PaymentStatus},
        user::{self, Role},
        user_allergen,
    },
    errors::ServiceError,
};
use chrono::{NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub balance: Decimal,
    pub is_active: bool,
}

/// Admin dashboard aggregates: headcounts, order flow and income.
#[derive(Debug, Serialize, ToSchema)]
pub struct Statistics {
    pub total_users: u64,
    pub total_students: u64,
    pub total_chefs: u64,
    pub total_admins: u64,
    pub total_orders: u64,
    pub today_orders: u64,
    pub active_orders: u64,
    pub ready_orders: u64,
    pub picked_up_orders: u64,
    pub total_income: Decimal,
    pub today_income: Decimal,
    pub total_payments: u64,
}

/// User administration and reporting.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<UserSummary>, ServiceError> {
        let users = user::Entity::find()
            .order_by_asc(user::Column::Username)
            .all(&*self.db)
            .await?;
        Ok(users
            .into_iter()
            .map(|u| UserSummary {
                id: u.id,
                username: u.username,
                email: u.email,
                role: u.role,
                balance: u.balance,
                is_active: u.is_active,
            })
            .collect())
    }

    /// Changes an account's role. The closed enum means no other roles can
    /// arrive here.
    #[instrument(skip(self), fields(user_id = %user_id, role = %role))]
    pub async fn change_role(
        &self,
        user_id: Uuid,
        role: Role,
    ) -> Result<UserSummary, ServiceError> {
        let account = user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("account not found".into()))?;

        let mut active: user::ActiveModel = account.into();
        active.role = Set(role);
        let updated = active.update(&*self.db).await?;

        info!(user_id = %user_id, role = %role, "role changed");
        Ok(UserSummary {
            id: updated.id,
            username: updated.username,
            email: updated.email,
            role: updated.role,
            balance: updated.balance,
            is_active: updated.is_active,
        })
    }

    /// Replaces the caller's allergen list.
    pub async fn set_allergens(
        &self,
        user_id: Uuid,
        ingredient_ids: Vec<Uuid>,
    ) -> Result<Vec<Uuid>, ServiceError> {
        let txn = self.db.begin().await?;

        user_allergen::Entity::delete_many()
            .filter(user_allergen::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        for ingredient_id in &ingredient_ids {
            let row = user_allergen::ActiveModel {
                user_id: Set(user_id),
                ingredient_id: Set(*ingredient_id),
            };
            row.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(ingredient_ids)
    }

    pub async fn statistics(&self) -> Result<Statistics, ServiceError> {
        let db = &*self.db;
        let today_start = Utc::now()
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();

        let total_users = user::Entity::find().count(db).await?;
        let total_students = user::Entity::find()
            .filter(user::Column::Role.eq(Role::Student))
            .count(db)
            .await?;
        let total_chefs = user::Entity::find()
            .filter(user::Column::Role.eq(Role::Chef))
            .count(db)
            .await?;
        let total_admins = user::Entity::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .count(db)
            .await?;

        let total_orders = order::Entity::find().count(db).await?;
        let today_orders = order::Entity::find()
            .filter(order::Column::CreatedAt.gte(today_start))
            .count(db)
            .await?;
        let active_orders = order::Entity::find()
            .filter(order::Column::Status.is_in([
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Preparing,
                OrderStatus::Ready,
            ]))
            .count(db)
            .await?;
        let ready_orders = order::Entity::find()
            .filter(order::Column::Status.eq(OrderStatus::Ready))
            .count(db)
            .await?;
        let picked_up_orders = order_pickup::Entity::find().count(db).await?;

        let total_income = self.paid_amount_since(None).await?;
        let today_income = self.paid_amount_since(Some(today_start)).await?;
        let total_payments = payment::Entity::find()
            .filter(payment::Column::Status.eq(PaymentStatus::Paid))
            .count(db)
            .await?;

        Ok(Statistics {
            total_users,
            total_students,
            total_chefs,
            total_admins,
            total_orders,
            today_orders,
            active_orders,
            ready_orders,
            picked_up_orders,
            total_income,
            today_income,
            total_payments,
        })
    }

    async fn paid_amount_since(
        &self,
        since: Option<chrono::DateTime<Utc>>,
    ) -> Result<Decimal, ServiceError> {
        let mut query = payment::Entity::find()
            .filter(payment::Column::Status.eq(PaymentStatus::Paid))
            .select_only()
            .column_as(payment::Column::Amount.sum(), "total");
        if let Some(since) = since {
            query = query.filter(payment::Column::CreatedAt.gte(since));
        }
        let total: Option<Option<Decimal>> = query.into_tuple().one(&*self.db).await?;
        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }
}
