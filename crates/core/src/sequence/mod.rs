//! Daily-reset document number sequences.
//!
//! Numbers are human-readable, date-scoped, and collision-free:
//! `PREFIX-YYMMDD-NNN`. The store layer advances the per-domain counter
//! inside an atomic transaction so concurrent callers never share a number.

pub mod counter;

pub use counter::{SequenceCounter, SequenceDomain, format_number};
