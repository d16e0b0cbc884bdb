//! Category/supplier/product rollup of confirmed orders.
//!
//! Aggregation is a reporting view recomputed on demand from a snapshot of
//! confirmed orders and current stock; it is never a source of truth.

pub mod engine;
pub mod types;

pub use engine::aggregate;
pub use types::{
    CategoryRollup, CategoryTree, ProductRollup, ProductSnapshot, SupplierRollup, UNCLASSIFIED,
    UNKNOWN_SUPPLIER,
};
