mod common;

use assert_matches::assert_matches;
use cantina_api::{
    entities::{
        balance_transaction::{self, TransactionKind},
        payment::{self, PaymentStatus},
        prepared_dish,
        user::Role,
    },
    errors::ServiceError,
};
use chrono::Utc;
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn checkout_reserves_stock_debits_balance_and_records_payment() {
    let app = TestApp::new().await;
    let student = app.seed_user(Role::Student, dec!(500.00)).await;
    let category = app.seed_category("soups").await;

    // Recipe: 150 g of potato and 50 ml of cream per serving.
    let potato = app
        .seed_ingredient("potato", "g", dec!(1000.00), dec!(100.00))
        .await;
    let cream = app
        .seed_ingredient("cream", "ml", dec!(500.00), dec!(50.00))
        .await;
    let soup = app
        .seed_dish(
            "potato soup",
            dec!(80.50),
            category,
            &[(potato.id, dec!(150.00)), (cream.id, dec!(50.00))],
        )
        .await;

    // Two servings in the cart.
    app.state
        .services
        .carts
        .add_item(student.id, soup.id, 2)
        .await
        .expect("add to cart failed");

    let order = app
        .state
        .services
        .orders
        .checkout(student.id)
        .await
        .expect("checkout failed");

    assert_eq!(order.total_price, dec!(161.00));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].price_at_time, dec!(80.50));

    // Stock down by exactly recipe x 2.
    assert_eq!(app.stock_level(potato.id).await, dec!(700.00));
    assert_eq!(app.stock_level(cream.id).await, dec!(400.00));

    // Balance down by the order total, with a ledger row.
    assert_eq!(app.balance_of(student.id).await, dec!(339.00));
    let ledger = balance_transaction::Entity::find()
        .filter(balance_transaction::Column::UserId.eq(student.id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].kind, TransactionKind::Payment);
    assert_eq!(ledger[0].amount, dec!(-161.00));
    assert_eq!(ledger[0].balance_after, dec!(339.00));

    // Exactly one paid payment for the order.
    let payments = payment::Entity::find()
        .filter(payment::Column::OrderId.eq(order.id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Paid);
    assert_eq!(payments[0].amount, dec!(161.00));

    // Cart is converted; the next view yields an empty one.
    let cart = app.state.services.carts.view(student.id).await.unwrap();
    assert!(cart.items.is_empty());
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn failed_checkout_leaves_no_partial_state() {
    let app = TestApp::new().await;
    let student = app.seed_user(Role::Student, dec!(10.00)).await;
    let category = app.seed_category("mains").await;

    let rice = app
        .seed_ingredient("rice", "g", dec!(400.00), dec!(50.00))
        .await;
    let pilaf = app
        .seed_dish("pilaf", dec!(120.00), category, &[(rice.id, dec!(200.00))])
        .await;

    app.state
        .services
        .carts
        .add_item(student.id, pilaf.id, 2)
        .await
        .unwrap();

    // Stock suffices (400 >= 2 x 200) but the balance does not, so the
    // whole transaction must roll back, including the stock decrement.
    let err = app
        .state
        .services
        .orders
        .checkout(student.id)
        .await
        .expect_err("checkout should fail");
    assert_matches!(err, ServiceError::InsufficientBalance { .. });

    assert_eq!(app.stock_level(rice.id).await, dec!(400.00));
    assert_eq!(app.balance_of(student.id).await, dec!(10.00));

    let orders = cantina_api::entities::order::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(orders.is_empty(), "no order row should survive");

    // Cart is untouched and still usable.
    let cart = app.state.services.carts.view(student.id).await.unwrap();
    assert_eq!(cart.items.len(), 1);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn checkout_with_insufficient_stock_reports_missing_ingredients() {
    let app = TestApp::new().await;
    let student = app.seed_user(Role::Student, dec!(1000.00)).await;
    let category = app.seed_category("mains").await;

    let beef = app
        .seed_ingredient("beef", "g", dec!(100.00), dec!(50.00))
        .await;
    let steak = app
        .seed_dish("steak", dec!(300.00), category, &[(beef.id, dec!(250.00))])
        .await;

    app.state
        .services
        .carts
        .add_item(student.id, steak.id, 1)
        .await
        .unwrap();

    let err = app
        .state
        .services
        .orders
        .checkout(student.id)
        .await
        .expect_err("checkout should fail");
    assert_matches!(err, ServiceError::InsufficientStock(_));

    assert_eq!(app.stock_level(beef.id).await, dec!(100.00));
    assert_eq!(app.balance_of(student.id).await, dec!(1000.00));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn checkout_prefers_prepared_units_over_raw_stock() {
    let app = TestApp::new().await;
    let student = app.seed_user(Role::Student, dec!(500.00)).await;
    let category = app.seed_category("bakery").await;

    let flour = app
        .seed_ingredient("flour", "g", dec!(100.00), dec!(50.00))
        .await;
    let pirozhok = app
        .seed_dish("pirozhok", dec!(30.00), category, &[(flour.id, dec!(100.00))])
        .await;

    // Two ready units on the shelf; raw stock only covers one more.
    let shelf = prepared_dish::ActiveModel {
        id: Set(Uuid::new_v4()),
        dish_id: Set(pirozhok.id),
        quantity: Set(2),
        max_quantity: Set(20),
        prepared_at: Set(Utc::now()),
        prepared_by: Set(None),
    };
    shelf.insert(&*app.state.db).await.unwrap();

    app.state
        .services
        .carts
        .add_item(student.id, pirozhok.id, 3)
        .await
        .unwrap();

    app.state
        .services
        .orders
        .checkout(student.id)
        .await
        .expect("checkout should succeed: 2 prepared + 1 cooked");

    // Both prepared units consumed, only one serving cooked from flour.
    assert_eq!(app.stock_level(flour.id).await, dec!(0.00));
    let shelf = prepared_dish::Entity::find()
        .filter(prepared_dish::Column::DishId.eq(pirozhok.id))
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shelf.quantity, 0);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn cancelling_a_paid_order_refunds_and_restores_prepared_units() {
    let app = TestApp::new().await;
    let student = app.seed_user(Role::Student, dec!(100.00)).await;
    let category = app.seed_category("bakery").await;

    let flour = app
        .seed_ingredient("flour", "g", dec!(0.00), dec!(10.00))
        .await;
    let bun = app
        .seed_dish("bun", dec!(25.00), category, &[(flour.id, dec!(50.00))])
        .await;

    let shelf = prepared_dish::ActiveModel {
        id: Set(Uuid::new_v4()),
        dish_id: Set(bun.id),
        quantity: Set(2),
        max_quantity: Set(20),
        prepared_at: Set(Utc::now()),
        prepared_by: Set(None),
    };
    shelf.insert(&*app.state.db).await.unwrap();

    app.state
        .services
        .carts
        .add_item(student.id, bun.id, 2)
        .await
        .unwrap();
    let order = app
        .state
        .services
        .orders
        .checkout(student.id)
        .await
        .unwrap();
    assert_eq!(app.balance_of(student.id).await, dec!(50.00));

    let cancelled = app
        .state
        .services
        .orders
        .cancel(order.id, student.id)
        .await
        .expect("cancel failed");
    assert_eq!(
        cancelled.status,
        cantina_api::entities::order::OrderStatus::Cancelled
    );

    // Money back, with a refund ledger row; units back on the shelf.
    assert_eq!(app.balance_of(student.id).await, dec!(100.00));
    let refunds = balance_transaction::Entity::find()
        .filter(balance_transaction::Column::UserId.eq(student.id))
        .filter(balance_transaction::Column::Kind.eq(TransactionKind::Refund))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].amount, dec!(50.00));

    let shelf = prepared_dish::Entity::find()
        .filter(prepared_dish::Column::DishId.eq(bun.id))
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shelf.quantity, 2);
}
