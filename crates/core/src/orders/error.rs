//! Order error types.

use thiserror::Error;

use super::types::OrderStatus;

/// Errors that can occur during order creation and lifecycle transitions.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Line quantity must be positive.
    #[error("Line quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),

    /// Unit price cannot be negative.
    #[error("Unit price cannot be negative")]
    NegativeUnitPrice,

    /// The requested status transition is not allowed.
    #[error("Cannot transition order from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },
}

impl OrderError {
    /// Returns the error code for boundary responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveQuantity(_) => "NON_POSITIVE_QUANTITY",
            Self::NegativeUnitPrice => "NEGATIVE_UNIT_PRICE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }
}
