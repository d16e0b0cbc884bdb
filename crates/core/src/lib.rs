//! Core business logic for Provender.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and calculations live
//! here.
//!
//! # Modules
//!
//! - `orders` - Sale/purchase orders and status transitions
//! - `cutoff` - Cutoff cycle state machine and order phase classification
//! - `aggregation` - Category/supplier/product rollup of confirmed orders
//! - `inventory` - FIFO lot inventory ledger
//! - `ledger` - Account postings and statement generation
//! - `sequence` - Daily-reset document number sequences

pub mod aggregation;
pub mod cutoff;
pub mod inventory;
pub mod ledger;
pub mod orders;
pub mod sequence;
