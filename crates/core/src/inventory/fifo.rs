//! FIFO receipt and consumption over the lot list.
//!
//! Both operations compute their full result in memory; the store layer
//! commits the mutated inventory in a single atomic write, so a failure here
//! never leaves a partially consumed product behind.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::InventoryError;
use super::types::{Lot, ProductInventory};

impl ProductInventory {
    /// Records a receipt of `quantity` units dated `lot_date` at `price`.
    ///
    /// A receipt on a date that already has a lot merges into it: quantity and
    /// stock both grow, and the price is overwritten (last write wins). A
    /// receipt on a new date inserts a lot, keeping the list sorted ascending
    /// by date.
    ///
    /// # Errors
    ///
    /// Returns an error if `quantity` is not positive or `price` is negative.
    pub fn receive(
        &mut self,
        lot_date: NaiveDate,
        quantity: i64,
        price: Decimal,
    ) -> Result<(), InventoryError> {
        if quantity <= 0 {
            return Err(InventoryError::NonPositiveQuantity(quantity));
        }
        if price < Decimal::ZERO {
            return Err(InventoryError::NegativePrice);
        }

        match self.lots.binary_search_by_key(&lot_date, |l| l.lot_date) {
            Ok(index) => {
                let lot = &mut self.lots[index];
                lot.quantity += quantity;
                lot.stock += quantity;
                lot.price = price;
            }
            Err(index) => {
                self.lots.insert(index, Lot::new(lot_date, quantity, price));
            }
        }

        self.recompute();
        Ok(())
    }

    /// Consumes `quantity` units oldest-lot-first.
    ///
    /// Deducts from each lot in date order until the request is satisfied.
    /// Depleted lots are retained at stock 0.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock` (with nothing deducted) if `quantity`
    /// exceeds the total stock, or a validation error for a non-positive
    /// quantity.
    pub fn consume(&mut self, quantity: i64) -> Result<(), InventoryError> {
        if quantity <= 0 {
            return Err(InventoryError::NonPositiveQuantity(quantity));
        }
        if quantity > self.stock_quantity {
            return Err(InventoryError::InsufficientStock {
                requested: quantity,
                available: self.stock_quantity,
            });
        }

        let mut remaining = quantity;
        for lot in &mut self.lots {
            if remaining == 0 {
                break;
            }
            let take = lot.stock.min(remaining);
            lot.stock -= take;
            remaining -= take;
        }

        debug_assert_eq!(remaining, 0);
        self.recompute();
        Ok(())
    }
}


#[cfg(test)]
#[path = "fifo_props.rs"]
mod props;
