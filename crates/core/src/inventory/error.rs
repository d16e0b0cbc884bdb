//! Inventory error types.

use thiserror::Error;

/// Errors that can occur during lot receipt and consumption.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Quantity must be positive.
    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),

    /// Price cannot be negative.
    #[error("Price cannot be negative")]
    NegativePrice,

    /// Requested consumption exceeds available stock.
    ///
    /// No partial consumption is applied; the lots are left untouched.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Quantity the caller asked to consume.
        requested: i64,
        /// Total stock across all lots.
        available: i64,
    },
}

impl InventoryError {
    /// Returns the error code for boundary responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveQuantity(_) => "NON_POSITIVE_QUANTITY",
            Self::NegativePrice => "NEGATIVE_PRICE",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
        }
    }
}
