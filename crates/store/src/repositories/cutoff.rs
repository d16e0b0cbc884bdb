//! Cutoff cycle persistence and the close transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use provender_core::cutoff::CutoffCycle;
use provender_core::orders::OrderPhase;
use provender_shared::AppError;
use thiserror::Error;

use super::collections;
use crate::engine::{MemoryStore, StoreError};

/// Errors from cutoff cycle operations.
#[derive(Debug, Error)]
pub enum CycleError {
    /// No cycle has been opened yet.
    #[error("No cutoff cycle has been opened")]
    NotInitialized,

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CycleError> for AppError {
    fn from(err: CycleError) -> Self {
        match err {
            CycleError::NotInitialized => Self::NotFound(err.to_string()),
            CycleError::Store(e) => e.into(),
        }
    }
}

/// Stores the single current cutoff cycle and its archive of finalized ones.
///
/// The current cycle lives under a fixed document id; closing it archives the
/// finalized cycle under its own id and replaces the current document with
/// the successor in one atomic commit.
#[derive(Debug, Clone)]
pub struct CutoffCycleRepository {
    store: Arc<MemoryStore>,
}

impl CutoffCycleRepository {
    /// Creates a repository over the given store.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Returns the current cycle, opening the initial regular window at `now`
    /// if none exists yet.
    ///
    /// # Errors
    ///
    /// Returns a storage error on serialization failure or exhausted retries.
    pub async fn ensure_open(&self, now: DateTime<Utc>) -> Result<CutoffCycle, CycleError> {
        self.store
            .transact(|txn| {
                if let Some(current) =
                    txn.get::<CutoffCycle>(collections::CYCLES, collections::CURRENT_CYCLE)?
                {
                    return Ok(current);
                }
                let initial = CutoffCycle::initial(now);
                txn.put(collections::CYCLES, collections::CURRENT_CYCLE, &initial)?;
                Ok(initial)
            })
            .await
    }

    /// Returns the current cycle.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::NotInitialized`] before the first
    /// [`Self::ensure_open`].
    pub fn current(&self) -> Result<CutoffCycle, CycleError> {
        self.store
            .get::<CutoffCycle>(collections::CYCLES, collections::CURRENT_CYCLE)?
            .ok_or(CycleError::NotInitialized)
    }

    /// Classifies an order placed at `placed_at` against the current cycle.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::NotInitialized`] before the first cycle opens.
    pub fn classify(&self, placed_at: DateTime<Utc>) -> Result<OrderPhase, CycleError> {
        Ok(self.current()?.classify(placed_at))
    }

    /// Closes the current cycle at `now` and returns the open successor.
    ///
    /// Idempotent under concurrency: a successor opens at the close instant,
    /// so a duplicate trigger carrying the same timestamp finds a cycle it
    /// cannot close and gets the already-opened successor back. Exactly one
    /// new window results no matter how two triggers interleave.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::NotInitialized`] before the first cycle opens.
    pub async fn close(&self, now: DateTime<Utc>) -> Result<CutoffCycle, CycleError> {
        self.store
            .transact(|txn| {
                let current: CutoffCycle = txn
                    .get(collections::CYCLES, collections::CURRENT_CYCLE)?
                    .ok_or(CycleError::NotInitialized)?;
                if now <= current.opened_at {
                    return Ok(current);
                }

                let (finalized, successor) = current.close(now);
                txn.put(
                    collections::CYCLES,
                    &finalized.id.to_string(),
                    &finalized,
                )?;
                txn.put(collections::CYCLES, collections::CURRENT_CYCLE, &successor)?;
                Ok(successor)
            })
            .await
    }

    /// Returns true if any cycle has ever been closed.
    ///
    /// # Errors
    ///
    /// Returns a storage error on serialization failure.
    pub fn has_closed_cycle(&self) -> Result<bool, CycleError> {
        let cycles: Vec<CutoffCycle> = self.store.query(collections::CYCLES)?;
        Ok(cycles.iter().any(CutoffCycle::is_closed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use provender_core::cutoff::CycleStatus;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    fn repo() -> CutoffCycleRepository {
        CutoffCycleRepository::new(Arc::new(MemoryStore::new(200, 64)))
    }

    #[tokio::test]
    async fn test_current_before_open_is_not_initialized() {
        let repo = repo();
        assert!(matches!(repo.current(), Err(CycleError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_ensure_open_is_idempotent() {
        let repo = repo();
        let first = repo.ensure_open(at(2025, 3, 10, 6)).await.unwrap();
        let second = repo.ensure_open(at(2025, 3, 10, 9)).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.opened_at, at(2025, 3, 10, 6));
    }

    #[tokio::test]
    async fn test_close_archives_and_opens_successor() {
        let repo = repo();
        let opened = repo.ensure_open(at(2025, 3, 10, 6)).await.unwrap();

        let successor = repo.close(at(2025, 3, 10, 14)).await.unwrap();
        assert_ne!(successor.id, opened.id);
        assert_eq!(successor.phase, OrderPhase::Additional);
        assert_eq!(repo.current().unwrap().id, successor.id);

        let archived: CutoffCycle = repo
            .store
            .get(collections::CYCLES, &opened.id.to_string())
            .unwrap()
            .unwrap();
        assert_eq!(archived.status, CycleStatus::Closed);
        assert_eq!(archived.closed_at, Some(at(2025, 3, 10, 14)));
    }

    #[tokio::test]
    async fn test_has_closed_cycle_flips_after_first_close() {
        let repo = repo();
        repo.ensure_open(at(2025, 3, 10, 6)).await.unwrap();
        assert!(!repo.has_closed_cycle().unwrap());
        repo.close(at(2025, 3, 10, 14)).await.unwrap();
        assert!(repo.has_closed_cycle().unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_close_opens_exactly_one_successor() {
        let repo = repo();
        repo.ensure_open(at(2025, 3, 10, 6)).await.unwrap();

        let close_time = at(2025, 3, 10, 14);
        let a = {
            let repo = repo.clone();
            tokio::spawn(async move { repo.close(close_time).await })
        };
        let b = {
            let repo = repo.clone();
            tokio::spawn(async move { repo.close(close_time).await })
        };
        let first = a.await.unwrap().unwrap();
        let second = b.await.unwrap().unwrap();

        // Both callers observe the same successor window.
        assert_eq!(first.id, second.id);

        // Exactly one cycle was finalized.
        let cycles: Vec<CutoffCycle> = repo.store.query(collections::CYCLES).unwrap();
        let closed = cycles.iter().filter(|c| c.is_closed()).count();
        assert_eq!(closed, 1);
    }
}
