//! Property tests for the aggregation engine.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::aggregate;
use super::super::types::ProductSnapshot;
use crate::orders::{Order, OrderItem, OrderKind, OrderPhase, OrderStatus};
use chrono::Utc;
use provender_shared::types::{PartyId, ProductId};

/// A compact order description: per line (product index, quantity, price).
fn orders_strategy() -> impl Strategy<Value = Vec<(bool, Vec<(u8, i64, i64)>)>> {
    prop::collection::vec(
        (
            any::<bool>(),
            prop::collection::vec((0u8..6, 1i64..50, 0i64..5_000), 0..5),
        ),
        0..12,
    )
}

fn build_orders(
    spec: &[(bool, Vec<(u8, i64, i64)>)],
    product_ids: &[ProductId],
) -> Vec<Order> {
    spec.iter()
        .map(|(confirmed, lines)| {
            let items = lines
                .iter()
                .map(|&(idx, quantity, price)| {
                    OrderItem::new(
                        product_ids[idx as usize],
                        format!("product-{idx}"),
                        None,
                        quantity,
                        Decimal::from(price),
                    )
                    .unwrap()
                })
                .collect();
            let mut order = Order::new(
                OrderKind::Sale,
                PartyId::new(),
                OrderPhase::Regular,
                Utc::now(),
                items,
            );
            if *confirmed {
                order.transition(OrderStatus::Confirmed).unwrap();
            }
            order
        })
        .collect()
}

fn lookup(id: ProductId, product_ids: &[ProductId]) -> Option<ProductSnapshot> {
    // Half the products resolve to a category/supplier, the rest are gone.
    let idx = product_ids.iter().position(|p| *p == id)?;
    (idx % 2 == 0).then(|| ProductSnapshot {
        category: Some(format!("category-{}", idx / 2)),
        supplier: Some("supplier".to_string()),
        stock_quantity: i64::try_from(idx).unwrap() * 10,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(150))]

    /// The grand total equals the sum of line totals over confirmed orders,
    /// and every level's totals are consistent with its children.
    #[test]
    fn prop_totals_consistent_at_every_level(spec in orders_strategy()) {
        let product_ids: Vec<ProductId> = (0..6).map(|_| ProductId::new()).collect();
        let orders = build_orders(&spec, &product_ids);

        let tree = aggregate(&orders, |id| lookup(id, &product_ids));

        let expected_amount: Decimal = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Confirmed)
            .flat_map(|o| &o.items)
            .map(|i| i.line_total)
            .sum();
        let expected_quantity: i64 = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Confirmed)
            .flat_map(|o| &o.items)
            .map(|i| i.quantity)
            .sum();

        prop_assert_eq!(tree.total_amount, expected_amount);
        prop_assert_eq!(tree.total_quantity, expected_quantity);

        let category_amount: Decimal = tree.categories.values().map(|c| c.total_amount).sum();
        prop_assert_eq!(category_amount, tree.total_amount);

        for category in tree.categories.values() {
            let supplier_amount: Decimal =
                category.suppliers.values().map(|s| s.total_amount).sum();
            prop_assert_eq!(supplier_amount, category.total_amount);

            for supplier in category.suppliers.values() {
                let product_amount: Decimal =
                    supplier.products.values().map(|p| p.total_amount).sum();
                prop_assert_eq!(product_amount, supplier.total_amount);
                let product_quantity: i64 =
                    supplier.products.values().map(|p| p.total_quantity).sum();
                prop_assert_eq!(product_quantity, supplier.total_quantity);
            }
        }
    }

    /// Shuffling input order never changes any bucket total.
    #[test]
    fn prop_input_order_irrelevant(spec in orders_strategy()) {
        let product_ids: Vec<ProductId> = (0..6).map(|_| ProductId::new()).collect();
        let orders = build_orders(&spec, &product_ids);
        let mut reversed = orders.clone();
        reversed.reverse();

        let forward = aggregate(&orders, |id| lookup(id, &product_ids));
        let backward = aggregate(&reversed, |id| lookup(id, &product_ids));

        prop_assert_eq!(forward.total_amount, backward.total_amount);
        prop_assert_eq!(
            forward.categories.keys().collect::<Vec<_>>(),
            backward.categories.keys().collect::<Vec<_>>()
        );
        for (name, category) in &forward.categories {
            prop_assert_eq!(category.total_amount, backward.categories[name].total_amount);
        }
    }
}
