mod common;

use assert_matches::assert_matches;
use cantina_api::{
    entities::{
        stock_history::{self, StockOperation},
        user::Role,
    },
    errors::ServiceError,
    services::inventory,
};
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn availability_reports_every_short_ingredient() {
    let app = TestApp::new().await;
    let category = app.seed_category("salads").await;

    let cucumber = app
        .seed_ingredient("cucumber", "g", dec!(100.00), dec!(10.00))
        .await;
    let tomato = app
        .seed_ingredient("tomato", "g", dec!(500.00), dec!(10.00))
        .await;
    let salad = app
        .seed_dish(
            "summer salad",
            dec!(60.00),
            category,
            &[(cucumber.id, dec!(80.00)), (tomato.id, dec!(120.00))],
        )
        .await;

    // One serving fits, two do not (cucumber runs out).
    let one = app
        .state
        .services
        .inventory
        .check_availability(salad.id, 1)
        .await
        .unwrap();
    assert!(one.available);
    assert!(one.missing.is_empty());

    let two = app
        .state
        .services
        .inventory
        .check_availability(salad.id, 2)
        .await
        .unwrap();
    assert!(!two.available);
    assert_eq!(two.missing.len(), 1);
    assert_eq!(two.missing[0].ingredient_id, cucumber.id);
    assert_eq!(two.missing[0].required, dec!(160.00));
    assert_eq!(two.missing[0].available, dec!(100.00));
    assert_eq!(two.missing[0].missing, dec!(60.00));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn reservation_decrements_stock_and_appends_usage_ledger_rows() {
    let app = TestApp::new().await;
    let chef = app.seed_user(Role::Chef, dec!(0)).await;
    let category = app.seed_category("soups").await;

    let onion = app
        .seed_ingredient("onion", "g", dec!(300.00), dec!(20.00))
        .await;
    let carrot = app
        .seed_ingredient("carrot", "g", dec!(200.00), dec!(20.00))
        .await;
    let soup = app
        .seed_dish(
            "broth",
            dec!(45.00),
            category,
            &[(onion.id, dec!(30.00)), (carrot.id, dec!(25.00))],
        )
        .await;

    // Cooking four servings through the prepared-dish path exercises
    // reserve_ingredients inside a transaction.
    app.state
        .services
        .inventory
        .prepare_dish(soup.id, 4, chef.id)
        .await
        .expect("prepare failed");

    assert_eq!(app.stock_level(onion.id).await, dec!(180.00));
    assert_eq!(app.stock_level(carrot.id).await, dec!(100.00));

    // One usage row per ingredient with before/after arithmetic intact.
    for (ing, before, delta) in [
        (onion.id, dec!(300.00), dec!(120.00)),
        (carrot.id, dec!(200.00), dec!(100.00)),
    ] {
        let rows = stock_history::Entity::find()
            .filter(stock_history::Column::IngredientId.eq(ing))
            .filter(stock_history::Column::Operation.eq(StockOperation::Usage))
            .all(&*app.state.db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity_change, -delta);
        assert_eq!(rows[0].quantity_before, before);
        assert_eq!(rows[0].quantity_after, before - delta);
        assert_eq!(rows[0].performed_by, Some(chef.id));
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn restock_waste_and_adjust_write_the_expected_ledger() {
    let app = TestApp::new().await;
    let admin = app.seed_user(Role::Admin, dec!(0)).await;
    let milk = app
        .seed_ingredient("milk", "ml", dec!(100.00), dec!(50.00))
        .await;

    // Priced movements carry total_cost.
    app.state
        .services
        .inventory
        .set_cost(milk.id, dec!(0.08))
        .await
        .unwrap();

    let after_restock = app
        .state
        .services
        .inventory
        .restock(milk.id, dec!(900.00), Some(admin.id), None)
        .await
        .unwrap();
    assert_eq!(after_restock.current_quantity, dec!(1000.00));

    let after_waste = app
        .state
        .services
        .inventory
        .waste(milk.id, dec!(200.00), Some(admin.id), Some("spoiled".into()))
        .await
        .unwrap();
    assert_eq!(after_waste.current_quantity, dec!(800.00));

    let after_adjust = app
        .state
        .services
        .inventory
        .adjust(milk.id, dec!(750.00), Some(admin.id), None)
        .await
        .unwrap();
    assert_eq!(after_adjust.current_quantity, dec!(750.00));

    // Request changes nothing but still lands in the ledger.
    app.state
        .services
        .inventory
        .request_restock(milk.id, dec!(500.00), Some(admin.id), None)
        .await
        .unwrap();
    assert_eq!(app.stock_level(milk.id).await, dec!(750.00));

    let rows = app
        .state
        .services
        .inventory
        .history(Some(milk.id))
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);

    let restock_row = rows
        .iter()
        .find(|r| r.operation == StockOperation::Restock)
        .expect("restock row");
    assert_eq!(restock_row.quantity_change, dec!(900.00));
    // 900 ml x 0.08 per ml
    assert_eq!(restock_row.total_cost, dec!(72.0000));

    let adjust_row = rows
        .iter()
        .find(|r| r.operation == StockOperation::Adjustment)
        .expect("adjustment row");
    assert_eq!(adjust_row.quantity_change, dec!(-50.00));

    let request_row = rows
        .iter()
        .find(|r| r.operation == StockOperation::Request)
        .expect("request row");
    assert_eq!(request_row.quantity_before, request_row.quantity_after);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn waste_never_drives_stock_negative() {
    let app = TestApp::new().await;
    let sugar = app
        .seed_ingredient("sugar", "g", dec!(50.00), dec!(10.00))
        .await;

    let err = app
        .state
        .services
        .inventory
        .waste(sugar.id, dec!(80.00), None, None)
        .await
        .expect_err("waste should fail");
    assert_matches!(err, ServiceError::InvalidOperation(_));
    assert_eq!(app.stock_level(sugar.id).await, dec!(50.00));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn prepared_cap_blocks_overcooking_and_rolls_back_reservation() {
    let app = TestApp::new().await;
    let chef = app.seed_user(Role::Chef, dec!(0)).await;
    let category = app.seed_category("bakery").await;

    let dough = app
        .seed_ingredient("dough", "g", dec!(10000.00), dec!(100.00))
        .await;
    let bun = app
        .seed_dish("bun", dec!(25.00), category, &[(dough.id, dec!(100.00))])
        .await;

    // Default cap is 20 for a fresh shelf row.
    let err = app
        .state
        .services
        .inventory
        .prepare_dish(bun.id, 25, chef.id)
        .await
        .expect_err("over-cap cooking should fail");
    assert_matches!(err, ServiceError::InvalidOperation(_));

    // The ingredient reservation inside the failed transaction rolled back.
    assert_eq!(app.stock_level(dough.id).await, dec!(10000.00));

    let ok = app
        .state
        .services
        .inventory
        .prepare_dish(bun.id, 20, chef.id)
        .await
        .unwrap();
    assert_eq!(ok.quantity, 20);
    assert_eq!(app.stock_level(dough.id).await, dec!(8000.00));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn take_and_restore_prepared_units_respect_caps() {
    let app = TestApp::new().await;
    let chef = app.seed_user(Role::Chef, dec!(0)).await;
    let category = app.seed_category("bakery").await;
    let dough = app
        .seed_ingredient("dough", "g", dec!(5000.00), dec!(100.00))
        .await;
    let bun = app
        .seed_dish("bun", dec!(25.00), category, &[(dough.id, dec!(100.00))])
        .await;

    app.state
        .services
        .inventory
        .prepare_dish(bun.id, 10, chef.id)
        .await
        .unwrap();

    let taken = inventory::take_prepared_units(&*app.state.db, bun.id, 15)
        .await
        .unwrap();
    assert_eq!(taken, 10, "only what is on the shelf can be taken");

    let restored = inventory::restore_prepared_units(&*app.state.db, bun.id, 15)
        .await
        .unwrap();
    assert_eq!(restored, 15, "cap is 20, so 15 fit back");

    let restored_again = inventory::restore_prepared_units(&*app.state.db, bun.id, 10)
        .await
        .unwrap();
    assert_eq!(restored_again, 5, "only 5 more fit under the cap");
}
