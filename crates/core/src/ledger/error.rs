//! Ledger error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during posting and statement generation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Posting amount cannot be negative.
    #[error("Posting amount cannot be negative")]
    NegativeAmount,

    /// Line quantity must be positive.
    #[error("Line quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),

    /// Statement period start must not be after its end.
    #[error("Invalid statement period: {start} is after {end}")]
    InvalidPeriod {
        /// Requested period start.
        start: NaiveDate,
        /// Requested period end.
        end: NaiveDate,
    },
}

impl LedgerError {
    /// Returns the error code for boundary responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::NonPositiveQuantity(_) => "NON_POSITIVE_QUANTITY",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
        }
    }
}
