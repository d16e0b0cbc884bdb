//! Account postings and statement generation.
//!
//! Purchase/sale ledgers are debit-side postings; payouts/collections are
//! credit-side postings. Statements replay both kinds chronologically from an
//! opening balance; the denormalized account balance is kept in sync by the
//! store layer inside the same transaction as each posting write.

pub mod error;
pub mod statement;
pub mod types;

pub use error::LedgerError;
pub use statement::StatementBuilder;
pub use types::{
    Account, LedgerPosting, Payment, PaymentKind, PaymentMethod, PaymentStatus, PostingItem,
    PostingKind, Statement, StatementEntry, StatementLine, StatementLineKind,
};
