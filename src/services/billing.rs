use crate::{
    entities::{
        balance_transaction::{self, TransactionKind},
        order,
        payment::{self, PaymentMethod, PaymentStatus},
        user,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceOverview {
    pub balance: Decimal,
    pub bonus_points: i32,
    pub transactions: Vec<balance_transaction::Model>,
    pub recent_orders: Vec<order::Model>,
}

/// Debits the user's balance and writes the matching ledger row. Fails with
/// `InsufficientBalance` instead of overdrawing. Must run inside the
/// caller's transaction so the order and the debit commit together.
pub async fn debit_balance<C: ConnectionTrait>(
    conn: &C,
    account: user::Model,
    amount: Decimal,
    kind: TransactionKind,
    description: &str,
    order_id: Option<Uuid>,
) -> Result<user::Model, ServiceError> {
    if !account.can_afford(amount) {
        return Err(ServiceError::InsufficientBalance {
            required: amount,
            available: account.balance,
        });
    }

    let new_balance = account.balance - amount;
    let mut active: user::ActiveModel = account.into();
    active.balance = Set(new_balance);
    let updated = active.update(conn).await?;

    append_transaction(conn, updated.id, -amount, kind, new_balance, description, order_id)
        .await?;
    Ok(updated)
}

/// Credits the user's balance and writes the matching ledger row.
pub async fn credit_balance<C: ConnectionTrait>(
    conn: &C,
    account: user::Model,
    amount: Decimal,
    kind: TransactionKind,
    description: &str,
    order_id: Option<Uuid>,
) -> Result<user::Model, ServiceError> {
    let new_balance = account.balance + amount;
    let mut active: user::ActiveModel = account.into();
    active.balance = Set(new_balance);
    let updated = active.update(conn).await?;

    append_transaction(conn, updated.id, amount, kind, new_balance, description, order_id)
        .await?;
    Ok(updated)
}

/// Inserts a completed payment record.
pub async fn record_payment<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    order_id: Option<Uuid>,
    amount: Decimal,
    method: PaymentMethod,
    description: &str,
) -> Result<payment::Model, ServiceError> {
    let now = Utc::now();
    let row = payment::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        user_id: Set(user_id),
        amount: Set(amount),
        status: Set(PaymentStatus::Paid),
        method: Set(method),
        description: Set(description.to_string()),
        created_at: Set(now),
        completed_at: Set(Some(now)),
    };
    Ok(row.insert(conn).await?)
}

async fn append_transaction<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    amount: Decimal,
    kind: TransactionKind,
    balance_after: Decimal,
    description: &str,
    order_id: Option<Uuid>,
) -> Result<balance_transaction::Model, ServiceError> {
    let row = balance_transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        amount: Set(amount),
        kind: Set(kind),
        balance_after: Set(balance_after),
        description: Set(description.to_string()),
        order_id: Set(order_id),
        created_at: Set(Utc::now()),
    };
    Ok(row.insert(conn).await?)
}

/// Stored-value account operations: top-ups and the transaction ledger.
#[derive(Clone)]
pub struct BillingService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl BillingService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Credits the balance from an external top-up. Credit, ledger row and
    /// payment record commit atomically.
    #[instrument(skip(self), fields(user_id = %user_id, amount = %amount))]
    pub async fn deposit(
        &self,
        user_id: Uuid,
        amount: Decimal,
    ) -> Result<BalanceOverview, ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "deposit amount must be positive".into(),
            ));
        }

        let txn = self.db.begin().await?;

        let account = user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("account not found".into()))?;

        credit_balance(
            &txn,
            account,
            amount,
            TransactionKind::Deposit,
            "balance top-up",
            None,
        )
        .await?;

        record_payment(
            &txn,
            user_id,
            None,
            amount,
            PaymentMethod::Balance,
            "balance top-up",
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::BalanceDeposited { user_id, amount })
            .await;
        info!(user_id = %user_id, amount = %amount, "balance deposited");

        self.overview(user_id).await
    }

    /// Balance, the full ledger and the five most recent orders.
    pub async fn overview(&self, user_id: Uuid) -> Result<BalanceOverview, ServiceError> {
        let account = user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("account not found".into()))?;

        let transactions = balance_transaction::Entity::find()
            .filter(balance_transaction::Column::UserId.eq(user_id))
            .order_by_desc(balance_transaction::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let recent_orders = order::Entity::find()
            .filter(order::Column::CustomerId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .limit(5)
            .all(&*self.db)
            .await?;

        Ok(BalanceOverview {
            balance: account.balance,
            bonus_points: account.bonus_points,
            transactions,
            recent_orders,
        })
    }
}
