//! Lot and per-product inventory types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A batch of inventory received on a given date at a given price.
///
/// Lots are never deleted: `stock` may reach 0 and the lot remains for audit
/// history. Invariant: `0 <= stock <= quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Receipt date (calendar-day granularity merge key).
    pub lot_date: NaiveDate,
    /// Original received amount, across all merged receipts.
    pub quantity: i64,
    /// Remaining unconsumed amount.
    pub stock: i64,
    /// Purchase price; the most recent receipt for the date wins.
    pub price: Decimal,
}

impl Lot {
    /// Creates a fresh lot with full stock.
    #[must_use]
    pub fn new(lot_date: NaiveDate, quantity: i64, price: Decimal) -> Self {
        Self {
            lot_date,
            quantity,
            stock: quantity,
            price,
        }
    }

    /// Returns true if this lot still has unconsumed stock.
    #[must_use]
    pub fn has_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Per-product inventory: the ordered lot list plus derived fields.
///
/// Invariant: `stock_quantity == sum(lot.stock)` after every operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductInventory {
    /// Lots ordered ascending by `lot_date`.
    pub lots: Vec<Lot>,
    /// Derived total stock across lots.
    pub stock_quantity: i64,
    /// Price of the most-recent-dated lot that still has stock.
    ///
    /// Left at its last known value when every lot is depleted.
    pub latest_purchase_price: Option<Decimal>,
}

impl ProductInventory {
    /// Recomputes the derived fields from the lot list.
    pub(crate) fn recompute(&mut self) {
        self.stock_quantity = self.lots.iter().map(|l| l.stock).sum();

        // Lots are kept sorted ascending, so the last lot with stock is the
        // most recent one.
        if let Some(lot) = self.lots.iter().rev().find(|l| l.has_stock()) {
            self.latest_purchase_price = Some(lot.price);
        }
    }
}
