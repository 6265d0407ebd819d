use cantina_api::entities::{
    combo_set,
    ingredient_cost,
    order::OrderStatus,
};
use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

fn combo(max_orders: i32, orders_used: i32, price: Decimal) -> combo_set::Model {
    combo_set::Model {
        id: Uuid::nil(),
        name: String::new(),
        description: String::new(),
        created_by: Uuid::nil(),
        total_price: price,
        max_orders,
        orders_used,
        is_active: true,
        created_at: Utc::now(),
    }
}

proptest! {
    /// remaining_orders = max(0, max_orders - orders_used), exactly.
    #[test]
    fn remaining_orders_formula(max_orders in 0i32..10_000, orders_used in 0i32..20_000) {
        let set = combo(max_orders, orders_used, Decimal::ONE);
        let remaining = set.remaining_orders();
        prop_assert!(remaining >= 0);
        prop_assert_eq!(remaining, (max_orders - orders_used).max(0));
        // Zero exactly when exhausted.
        prop_assert_eq!(remaining == 0, orders_used >= max_orders);
    }

    /// total_paid is exact decimal multiplication, independent of usage.
    #[test]
    fn total_paid_scales_with_max_orders(
        cents in 0i64..1_000_000,
        max_orders in 1i32..1_000,
        orders_used in 0i32..1_000,
    ) {
        let price = Decimal::new(cents, 2);
        let set = combo(max_orders, orders_used, price);
        prop_assert_eq!(set.total_paid(), price * Decimal::from(max_orders));
    }

    /// Ingredient cost arithmetic never loses precision for 2-dp inputs.
    #[test]
    fn ingredient_cost_is_exact(cost_cents in 0i64..10_000_000, qty_cents in 0i64..1_000_000) {
        let cost = ingredient_cost::Model {
            id: Uuid::nil(),
            ingredient_id: Uuid::nil(),
            cost_per_unit: Decimal::new(cost_cents, 2),
            last_updated: Utc::now(),
        };
        let qty = Decimal::new(qty_cents, 2);
        let total = cost.calculate_total_cost(qty);
        prop_assert_eq!(total, Decimal::new(cost_cents, 2) * qty);
        // Multiplying two 2-dp decimals yields at most 4 decimal places.
        prop_assert!(total.scale() <= 4);
    }
}

#[test]
fn order_status_machine_has_no_exit_from_terminal_states() {
    use sea_orm::Iterable;
    for from in OrderStatus::iter() {
        for to in OrderStatus::iter() {
            if from.is_terminal() {
                assert!(
                    !from.can_transition_to(to),
                    "{from} -> {to} must be rejected"
                );
            }
        }
    }
}

#[test]
fn every_nonterminal_status_has_a_way_forward() {
    use sea_orm::Iterable;
    for from in OrderStatus::iter() {
        if from.is_terminal() {
            continue;
        }
        assert!(
            OrderStatus::iter().any(|to| from.can_transition_to(to)),
            "{from} is a dead end"
        );
    }
}
