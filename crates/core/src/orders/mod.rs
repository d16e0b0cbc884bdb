//! Sale and purchase orders.
//!
//! This module implements the order domain:
//! - Order headers and captured line-item snapshots
//! - Status lifecycle (placed, confirmed, completed, rejected, pended)
//! - Phase tagging (regular vs additional) relative to the cutoff cycle
//! - Error types for order validation

pub mod error;
pub mod types;

pub use error::OrderError;
pub use types::{Order, OrderItem, OrderKind, OrderPhase, OrderStatus};
