//! Repositories binding the core domain logic to the document store.
//!
//! Each repository owns one slice of the document layout and routes every
//! shared-document mutation through [`crate::MemoryStore::transact`], so the
//! core invariants hold under concurrent callers.

pub mod account;
pub mod aggregation;
pub mod cutoff;
pub mod inventory;
pub mod orders;
pub mod sequence;

pub use account::{AccountRepository, Party, PartyKind, PostingError};
pub use aggregation::{AggregationService, PlanningError, PurchaseOrderDraft, PurchaseOrderLine};
pub use cutoff::{CutoffCycleRepository, CycleError};
pub use inventory::{InventoryRepository, Product, StockError};
pub use orders::{OrderEntryError, OrderRepository, OrderStatusCounts};
pub use sequence::SequenceGenerator;

/// Collection names of the document layout.
///
/// Shared across repositories: the aggregation service reads the cycle and
/// product collections the other repositories write.
pub(crate) mod collections {
    /// Cutoff cycles; the open one lives under [`CURRENT_CYCLE`], finalized
    /// ones are archived under their cycle id.
    pub const CYCLES: &str = "cutoff_cycles";
    /// Fixed id of the current open cycle document.
    pub const CURRENT_CYCLE: &str = "current";
    /// Sale and purchase orders, keyed by order id.
    pub const ORDERS: &str = "orders";
    /// Products with their embedded lot inventory, keyed by product id.
    pub const PRODUCTS: &str = "products";
    /// Customer and supplier parties, keyed by party id.
    pub const PARTIES: &str = "parties";
    /// Running accounts, keyed by the owning party id.
    pub const ACCOUNTS: &str = "accounts";
    /// Immutable ledger postings, keyed by posting id.
    pub const LEDGER_POSTINGS: &str = "ledger_postings";
    /// Immutable payment records, keyed by payment id.
    pub const PAYMENTS: &str = "payments";
    /// Per-domain sequence counters, keyed by domain.
    pub const SEQUENCES: &str = "sequence_counters";
}
