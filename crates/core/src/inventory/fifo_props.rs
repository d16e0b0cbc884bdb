//! Property tests for FIFO lot accounting.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::super::types::ProductInventory;

/// An arbitrary receive or consume request.
#[derive(Debug, Clone)]
enum Op {
    Receive { day: u32, quantity: i64, price: i64 },
    Consume { quantity: i64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u32..=28, 1i64..100, 1i64..10_000).prop_map(|(day, quantity, price)| Op::Receive {
            day,
            quantity,
            price
        }),
        (1i64..150).prop_map(|quantity| Op::Consume { quantity }),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..40)
}

fn apply(inv: &mut ProductInventory, op: &Op) {
    match *op {
        Op::Receive {
            day,
            quantity,
            price,
        } => {
            let lot_date = NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
            inv.receive(lot_date, quantity, Decimal::from(price)).unwrap();
        }
        Op::Consume { quantity } => {
            // Over-consumption is a legal request that must fail cleanly.
            let _ = inv.consume(quantity);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// After any sequence of operations, the derived stock total equals the
    /// sum of the per-lot stock.
    #[test]
    fn prop_stock_quantity_equals_lot_sum(ops in ops_strategy()) {
        let mut inv = ProductInventory::default();
        for op in &ops {
            apply(&mut inv, op);
            let lot_sum: i64 = inv.lots.iter().map(|l| l.stock).sum();
            prop_assert_eq!(inv.stock_quantity, lot_sum);
        }
    }

    /// Consumption never reduces a lot's stock while an earlier-dated lot
    /// still has stock: at every point, non-empty lots form a suffix of the
    /// date-ordered list (all earlier lots are fully drained).
    #[test]
    fn prop_fifo_consumes_oldest_first(ops in ops_strategy()) {
        let mut inv = ProductInventory::default();
        for op in &ops {
            if let Op::Consume { .. } = op {
                apply(&mut inv, op);
                let first_with_stock = inv.lots.iter().position(|l| l.has_stock());
                if let Some(first) = first_with_stock {
                    for lot in &inv.lots[..first] {
                        prop_assert_eq!(lot.stock, 0);
                    }
                }
            } else {
                apply(&mut inv, op);
            }
        }
    }

    /// Received minus successfully consumed equals remaining stock.
    #[test]
    fn prop_conservation_of_stock(ops in ops_strategy()) {
        let mut inv = ProductInventory::default();
        let mut received = 0i64;
        let mut consumed = 0i64;

        for op in &ops {
            match *op {
                Op::Receive { day, quantity, price } => {
                    let lot_date = NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
                    inv.receive(lot_date, quantity, Decimal::from(price)).unwrap();
                    received += quantity;
                }
                Op::Consume { quantity } => {
                    if inv.consume(quantity).is_ok() {
                        consumed += quantity;
                    }
                }
            }
        }

        prop_assert_eq!(inv.stock_quantity, received - consumed);
    }

    /// Lots are never deleted and stock never exceeds the received quantity.
    #[test]
    fn prop_lots_retained_within_bounds(ops in ops_strategy()) {
        let mut inv = ProductInventory::default();
        let mut distinct_dates = std::collections::BTreeSet::new();

        for op in &ops {
            if let Op::Receive { day, .. } = op {
                distinct_dates.insert(*day);
            }
            apply(&mut inv, op);
        }

        prop_assert_eq!(inv.lots.len(), distinct_dates.len());
        for lot in &inv.lots {
            prop_assert!(lot.stock >= 0);
            prop_assert!(lot.stock <= lot.quantity);
        }
    }
}
