mod common;

use assert_matches::assert_matches;
use cantina_api::{
    entities::{
        combo_order::ComboOrderStatus,
        order::{self, OrderStatus},
        user::Role,
    },
    errors::ServiceError,
    services::combos::{ComboItemRequest, CreateComboRequest},
};
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;

fn lunch_request(dish_id: uuid::Uuid, max_orders: i32) -> CreateComboRequest {
    CreateComboRequest {
        name: "lunch week".to_string(),
        description: String::new(),
        max_orders,
        items: vec![ComboItemRequest {
            dish_id,
            quantity: 2,
        }],
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn purchase_charges_the_full_bundle_up_front() {
    let app = TestApp::new().await;
    let student = app.seed_user(Role::Student, dec!(5000.00)).await;
    let category = app.seed_category("mains").await;
    let rice = app
        .seed_ingredient("rice", "g", dec!(10000.00), dec!(100.00))
        .await;
    let pilaf = app
        .seed_dish("pilaf", dec!(500.00), category, &[(rice.id, dec!(200.00))])
        .await;

    let combo = app
        .state
        .services
        .combos
        .create(student.id, lunch_request(pilaf.id, 5))
        .await
        .expect("combo purchase failed");

    // Single redemption: 2 x 500 = 1000; bundle: 1000 x 5 = 5000.
    assert_eq!(combo.total_price, dec!(1000.00));
    assert_eq!(combo.total_paid, dec!(5000.00));
    assert_eq!(combo.remaining_orders, 5);
    assert_eq!(app.balance_of(student.id).await, dec!(0.00));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn purchase_fails_without_funds_and_leaves_nothing_behind() {
    let app = TestApp::new().await;
    let student = app.seed_user(Role::Student, dec!(999.00)).await;
    let category = app.seed_category("mains").await;
    let rice = app
        .seed_ingredient("rice", "g", dec!(10000.00), dec!(100.00))
        .await;
    let pilaf = app
        .seed_dish("pilaf", dec!(500.00), category, &[(rice.id, dec!(200.00))])
        .await;

    let err = app
        .state
        .services
        .combos
        .create(student.id, lunch_request(pilaf.id, 1))
        .await
        .expect_err("purchase should fail");
    assert_matches!(err, ServiceError::InsufficientBalance { .. });

    let sets = app.state.services.combos.my_sets(student.id).await.unwrap();
    assert!(sets.is_empty(), "failed purchase must not leave a set");
    assert_eq!(app.balance_of(student.id).await, dec!(999.00));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn redemptions_consume_uses_and_exhaust_the_set() {
    let app = TestApp::new().await;
    let student = app.seed_user(Role::Student, dec!(2000.00)).await;
    let category = app.seed_category("mains").await;
    let rice = app
        .seed_ingredient("rice", "g", dec!(10000.00), dec!(100.00))
        .await;
    let pilaf = app
        .seed_dish("pilaf", dec!(500.00), category, &[(rice.id, dec!(200.00))])
        .await;

    let combo = app
        .state
        .services
        .combos
        .create(student.id, lunch_request(pilaf.id, 2))
        .await
        .unwrap();

    let first = app
        .state
        .services
        .combos
        .redeem(combo.id, student.id)
        .await
        .expect("first redemption failed");
    assert_eq!(first.status, ComboOrderStatus::Preparing);

    // Each redemption spawns a real kitchen order.
    let main_order = order::Entity::find_by_id(first.main_order_id.unwrap())
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(main_order.status, OrderStatus::Preparing);
    assert_eq!(main_order.total_price, dec!(1000.00));

    app.state
        .services
        .combos
        .redeem(combo.id, student.id)
        .await
        .expect("second redemption failed");

    // Exhausted: deactivated and rejected from further use.
    let err = app
        .state
        .services
        .combos
        .redeem(combo.id, student.id)
        .await
        .expect_err("third redemption must fail");
    assert_matches!(err, ServiceError::InvalidOperation(_) | ServiceError::NotFound(_));

    let sets = app.state.services.combos.my_sets(student.id).await.unwrap();
    assert!(sets.is_empty(), "an exhausted set is no longer usable");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn cancelling_a_redemption_steps_usage_back_and_reactivates() {
    let app = TestApp::new().await;
    let student = app.seed_user(Role::Student, dec!(2000.00)).await;
    let category = app.seed_category("mains").await;
    let rice = app
        .seed_ingredient("rice", "g", dec!(10000.00), dec!(100.00))
        .await;
    let pilaf = app
        .seed_dish("pilaf", dec!(1000.00), category, &[(rice.id, dec!(200.00))])
        .await;

    let combo = app
        .state
        .services
        .combos
        .create(student.id, lunch_request(pilaf.id, 1))
        .await
        .unwrap();
    assert_eq!(app.balance_of(student.id).await, dec!(0.00));

    let redemption = app
        .state
        .services
        .combos
        .redeem(combo.id, student.id)
        .await
        .unwrap();

    // The single use is gone.
    assert!(app
        .state
        .services
        .combos
        .redeem(combo.id, student.id)
        .await
        .is_err());

    let cancelled = app
        .state
        .services
        .combos
        .cancel_redemption(redemption.id, student.id)
        .await
        .expect("cancellation failed");
    assert_eq!(cancelled.status, ComboOrderStatus::Cancelled);

    // The use is restored and the set is active again.
    let sets = app.state.services.combos.my_sets(student.id).await.unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].remaining_orders, 1);
    assert!(sets[0].is_active);

    // The linked kitchen order was cancelled too. No balance refund: the
    // bundle itself stays prepaid.
    let main_order = order::Entity::find_by_id(redemption.main_order_id.unwrap())
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(main_order.status, OrderStatus::Cancelled);
    assert_eq!(app.balance_of(student.id).await, dec!(0.00));

    app.state
        .services
        .combos
        .redeem(combo.id, student.id)
        .await
        .expect("redemption works again after cancellation");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn only_the_owner_redeems_a_combo() {
    let app = TestApp::new().await;
    let owner = app.seed_user(Role::Student, dec!(2000.00)).await;
    let other = app.seed_user(Role::Student, dec!(2000.00)).await;
    let category = app.seed_category("mains").await;
    let rice = app
        .seed_ingredient("rice", "g", dec!(10000.00), dec!(100.00))
        .await;
    let pilaf = app
        .seed_dish("pilaf", dec!(100.00), category, &[(rice.id, dec!(200.00))])
        .await;

    let combo = app
        .state
        .services
        .combos
        .create(owner.id, lunch_request(pilaf.id, 3))
        .await
        .unwrap();

    let err = app
        .state
        .services
        .combos
        .redeem(combo.id, other.id)
        .await
        .expect_err("strangers cannot redeem");
    assert_matches!(err, ServiceError::Forbidden(_));
}
