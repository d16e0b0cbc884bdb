//! Store engine error types.

use provender_shared::AppError;
use thiserror::Error;

/// Errors surfaced by the document store engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Optimistic commit kept conflicting after the bounded retries.
    ///
    /// Transient: the caller may retry the whole operation.
    #[error("Transaction conflict persisted after {0} retries")]
    Conflict(u32),

    /// A document failed to (de)serialize.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if the caller may retry the failed operation as-is.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::Conflict(_) => Self::Conflict(err.to_string()),
            StoreError::Serialization(_) => Self::Internal(err.to_string()),
        }
    }
}
