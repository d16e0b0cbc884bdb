//! Sequence counter state and advance logic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Document domains that draw from independent sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceDomain {
    /// Supplier purchase orders.
    PurchaseOrder,
    /// Purchase ledger postings.
    PurchaseLedger,
    /// Sale ledger postings.
    SaleLedger,
    /// Supplier payouts.
    Payout,
    /// Customer collections.
    Collection,
}

impl SequenceDomain {
    /// Returns the document number prefix for this domain.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::PurchaseOrder => "PO",
            Self::PurchaseLedger => "PL",
            Self::SaleLedger => "SL",
            Self::Payout => "PAY",
            Self::Collection => "COL",
        }
    }

    /// Returns the storage key for this domain's counter document.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::PurchaseOrder => "purchase_order",
            Self::PurchaseLedger => "purchase_ledger",
            Self::SaleLedger => "sale_ledger",
            Self::Payout => "payout",
            Self::Collection => "collection",
        }
    }
}

/// Per-domain counter state: the last issued number and the day it belongs
/// to. A date rollover resets the counter to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceCounter {
    /// Last issued number for `current_date`.
    pub last_number: u32,
    /// Calendar day the counter is scoped to.
    pub current_date: NaiveDate,
}

impl SequenceCounter {
    /// Advances the counter for `today`, returning the updated state and the
    /// issued number.
    ///
    /// `counter` is `None` when no number was ever issued for the domain.
    /// The store layer writes the returned state back in the same atomic
    /// step as the read, so two concurrent callers can never both observe
    /// the same `last_number`.
    #[must_use]
    pub fn advance(counter: Option<Self>, today: NaiveDate) -> (Self, u32) {
        let next_number = match counter {
            Some(c) if c.current_date == today => c.last_number + 1,
            _ => 1,
        };
        (
            Self {
                last_number: next_number,
                current_date: today,
            },
            next_number,
        )
    }
}

/// Formats a document number as `PREFIX-YYMMDD-NNN`.
///
/// The counter part is zero-padded to three digits and grows naturally past
/// 999.
#[must_use]
pub fn format_number(domain: SequenceDomain, date: NaiveDate, number: u32) -> String {
    format!("{}-{}-{:03}", domain.prefix(), date.format("%y%m%d"), number)
}
