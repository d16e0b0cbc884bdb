//! Document store boundary and repositories for Provender.
//!
//! This crate provides:
//! - A versioned in-memory document store with an optimistic, bounded-retry
//!   atomic transaction primitive and a change-notification bus
//! - Repository abstractions binding the core business logic to storage:
//!   cutoff cycle, orders, inventory, accounts, sequence counters, and the
//!   live aggregation view
//!
//! Every mutation of a hot shared document (the current cutoff cycle, a
//! product's lot list, an account's balance, a sequence counter) goes through
//! the transaction primitive; direct read-then-write against those documents
//! is a correctness bug.

pub mod engine;
pub mod repositories;

pub use engine::{ChangeEvent, MemoryStore, StoreError};
pub use repositories::{
    AccountRepository, AggregationService, CutoffCycleRepository, InventoryRepository,
    OrderRepository, SequenceGenerator,
};
