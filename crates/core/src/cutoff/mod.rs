//! Cutoff cycle state machine.
//!
//! The cutoff cycle is the operative ordering/accounting window. Closing it
//! finalizes the window and immediately re-arms a fresh open cycle, so from a
//! caller's perspective the cycle is always open except for the instant of
//! the close transition itself.

pub mod types;

pub use types::{CutoffCycle, CycleStatus};
