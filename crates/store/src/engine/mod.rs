//! The versioned document store engine.
//!
//! Documents live in named collections as JSON values with a monotonically
//! increasing version. Reads are snapshot reads; multi-document mutations go
//! through [`MemoryStore::transact`], an optimistic read-modify-write with
//! bounded retry. Every committed write is published on the change bus.

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::{ChangeEvent, MemoryStore, Txn};
