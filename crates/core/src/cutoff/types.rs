//! Cutoff cycle types and transitions.

use chrono::{DateTime, Utc};
use provender_shared::types::CycleId;
use serde::{Deserialize, Serialize};

use crate::orders::OrderPhase;

/// Status of a cutoff cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStatus {
    /// Cycle is accepting orders.
    Open,
    /// Cycle has been finalized by a close.
    Closed,
}

/// The operative ordering window.
///
/// Exactly one cycle is current at any instant. The only transition is
/// [`CutoffCycle::close`], which finalizes this cycle and returns the open
/// successor. An order belongs to the current cycle iff
/// `placed_at >= opened_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutoffCycle {
    /// Unique identifier.
    pub id: CycleId,
    /// Open or closed.
    pub status: CycleStatus,
    /// When this cycle started accepting orders.
    pub opened_at: DateTime<Utc>,
    /// When this cycle was closed, if it has been.
    pub closed_at: Option<DateTime<Utc>>,
    /// Phase tagged onto orders placed within this cycle.
    pub phase: OrderPhase,
}

impl CutoffCycle {
    /// Creates the very first cycle, which is a regular ordering window.
    #[must_use]
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            id: CycleId::new(),
            status: CycleStatus::Open,
            opened_at: now,
            closed_at: None,
            phase: OrderPhase::Regular,
        }
    }

    /// Returns true if an order placed at `placed_at` belongs to this cycle.
    #[must_use]
    pub fn contains(&self, placed_at: DateTime<Utc>) -> bool {
        placed_at >= self.opened_at
    }

    /// Classifies an order placed at `placed_at`.
    ///
    /// Orders inside the current cycle carry the cycle's phase. Orders placed
    /// before `opened_at` belong to an already-finalized window and were
    /// regular for it.
    #[must_use]
    pub fn classify(&self, placed_at: DateTime<Utc>) -> OrderPhase {
        if self.contains(placed_at) {
            self.phase
        } else {
            OrderPhase::Regular
        }
    }

    /// Closes this cycle at `now` and opens the successor.
    ///
    /// Returns `(finalized, successor)`. The successor is open with
    /// `opened_at = now`. A close on the same calendar day as this cycle's
    /// `opened_at` opens a late-addition window; a close that rolls to a new
    /// calendar day re-arms a regular window.
    #[must_use]
    pub fn close(&self, now: DateTime<Utc>) -> (Self, Self) {
        let finalized = Self {
            status: CycleStatus::Closed,
            closed_at: Some(now),
            ..self.clone()
        };

        let successor_phase = if now.date_naive() == self.opened_at.date_naive() {
            OrderPhase::Additional
        } else {
            OrderPhase::Regular
        };

        let successor = Self {
            id: CycleId::new(),
            status: CycleStatus::Open,
            opened_at: now,
            closed_at: None,
            phase: successor_phase,
        };

        (finalized, successor)
    }

    /// Returns true if this cycle has ever been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == CycleStatus::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_initial_cycle_is_open_and_regular() {
        let t0 = at(2025, 3, 10, 6);
        let cycle = CutoffCycle::initial(t0);
        assert_eq!(cycle.status, CycleStatus::Open);
        assert_eq!(cycle.phase, OrderPhase::Regular);
        assert_eq!(cycle.opened_at, t0);
        assert!(cycle.closed_at.is_none());
    }

    #[test]
    fn test_membership_boundary_is_opened_at() {
        let t0 = at(2025, 3, 10, 6);
        let cycle = CutoffCycle::initial(t0);
        assert!(cycle.contains(t0));
        assert!(cycle.contains(at(2025, 3, 10, 7)));
        assert!(!cycle.contains(at(2025, 3, 10, 5)));
    }

    #[test]
    fn test_close_finalizes_and_opens_successor() {
        let t0 = at(2025, 3, 10, 6);
        let cycle = CutoffCycle::initial(t0);

        let close_time = at(2025, 3, 10, 14);
        let (finalized, successor) = cycle.close(close_time);

        assert_eq!(finalized.id, cycle.id);
        assert_eq!(finalized.status, CycleStatus::Closed);
        assert_eq!(finalized.closed_at, Some(close_time));

        assert_ne!(successor.id, cycle.id);
        assert_eq!(successor.status, CycleStatus::Open);
        assert_eq!(successor.opened_at, close_time);
        assert!(successor.closed_at.is_none());
    }

    #[test]
    fn test_same_day_close_opens_additional_window() {
        let cycle = CutoffCycle::initial(at(2025, 3, 10, 6));
        let (_, successor) = cycle.close(at(2025, 3, 10, 14));
        assert_eq!(successor.phase, OrderPhase::Additional);

        // Orders placed in the re-armed window are tagged additional.
        assert_eq!(
            successor.classify(at(2025, 3, 10, 15)),
            OrderPhase::Additional
        );
    }

    #[test]
    fn test_next_day_close_rearms_regular_window() {
        let cycle = CutoffCycle::initial(at(2025, 3, 10, 6));
        let (_, late_window) = cycle.close(at(2025, 3, 10, 14));
        let (_, next_day) = late_window.close(at(2025, 3, 11, 6));
        assert_eq!(next_day.phase, OrderPhase::Regular);
    }

    #[test]
    fn test_classify_before_window_is_regular() {
        let cycle = CutoffCycle::initial(at(2025, 3, 10, 6));
        let (_, successor) = cycle.close(at(2025, 3, 10, 14));
        // An order from the finalized window was regular for it.
        assert_eq!(
            successor.classify(at(2025, 3, 10, 10)),
            OrderPhase::Regular
        );
    }
}
