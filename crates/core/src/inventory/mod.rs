//! FIFO lot inventory ledger.
//!
//! Stock is tracked per receipt batch ("lot"). Receipts append or merge lots;
//! shipments consume stock oldest-lot-first. Depleted lots are retained at
//! zero stock for audit history.

pub mod error;
pub mod fifo;
pub mod types;

pub use error::InventoryError;
pub use types::{Lot, ProductInventory};
