//! Date-scoped document number issuance.

use std::sync::Arc;

use chrono::NaiveDate;
use provender_core::sequence::{SequenceCounter, SequenceDomain, format_number};

use super::collections;
use crate::engine::{MemoryStore, StoreError};

/// Issues gapless, date-scoped document numbers per [`SequenceDomain`].
///
/// The read-increment-write of the counter document runs inside one
/// transaction, so two concurrent callers can never be issued the same
/// number; the loser of the version race retries on the updated counter.
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    store: Arc<MemoryStore>,
}

impl SequenceGenerator {
    /// Creates a generator over the given store.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Issues the next number for `domain` on `today`, formatted as
    /// `PREFIX-YYMMDD-NNN`.
    ///
    /// The first issuance of a day starts at 1 regardless of where the
    /// previous day ended.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if contention exhausts the retry
    /// budget.
    pub async fn next(&self, domain: SequenceDomain, today: NaiveDate) -> Result<String, StoreError> {
        let number = self
            .store
            .transact::<_, StoreError, _>(|txn| {
                let stored: Option<SequenceCounter> =
                    txn.get(collections::SEQUENCES, domain.key())?;
                let (next, number) = SequenceCounter::advance(stored, today);
                txn.put(collections::SEQUENCES, domain.key(), &next)?;
                Ok(number)
            })
            .await?;
        Ok(format_number(domain, today, number))
    }
}
