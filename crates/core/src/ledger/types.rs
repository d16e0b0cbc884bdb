//! Ledger domain types.

use chrono::NaiveDate;
use provender_shared::types::{LedgerId, PartyId, PaymentId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Which side of the business a ledger posting records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingKind {
    /// Goods received from a supplier.
    Purchase,
    /// Goods shipped to a customer.
    Sale,
}

/// A line within a ledger posting, captured at receipt/shipment time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingItem {
    /// Product name at posting time.
    pub product_name: String,
    /// Specification at posting time.
    pub specification: Option<String>,
    /// Quantity received or shipped.
    pub quantity: i64,
    /// Unit price applied.
    pub unit_price: Decimal,
    /// `quantity * unit_price`.
    pub line_total: Decimal,
}

impl PostingItem {
    /// Creates a posting line, computing the line total.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive quantity or negative unit price.
    pub fn new(
        product_name: impl Into<String>,
        specification: Option<String>,
        quantity: i64,
        unit_price: Decimal,
    ) -> Result<Self, LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::NonPositiveQuantity(quantity));
        }
        if unit_price < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        Ok(Self {
            product_name: product_name.into(),
            specification,
            quantity,
            unit_price,
            line_total: Decimal::from(quantity) * unit_price,
        })
    }
}

/// An immutable purchase or sale ledger posting.
///
/// Created at receipt/shipment time and never edited afterwards; corrections
/// are new postings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerPosting {
    /// Unique identifier.
    pub id: LedgerId,
    /// Human-readable, date-scoped document number.
    pub number: String,
    /// The supplier (purchase) or customer (sale).
    pub party_id: PartyId,
    /// Purchase or sale.
    pub kind: PostingKind,
    /// Captured lines.
    pub items: Vec<PostingItem>,
    /// Sum of line totals.
    pub total_amount: Decimal,
    /// Number of lines.
    pub item_count: u32,
    /// Posting date.
    pub posted_on: NaiveDate,
}

impl LedgerPosting {
    /// Creates a posting from its lines, deriving totals.
    #[must_use]
    pub fn new(
        number: impl Into<String>,
        party_id: PartyId,
        kind: PostingKind,
        posted_on: NaiveDate,
        items: Vec<PostingItem>,
    ) -> Self {
        let total_amount = items.iter().map(|i| i.line_total).sum();
        let item_count = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Self {
            id: LedgerId::new(),
            number: number.into(),
            party_id,
            kind,
            items,
            total_amount,
            item_count,
            posted_on,
        }
    }
}

/// Direction of a money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    /// Money paid out to a supplier.
    Payout,
    /// Money collected from a customer.
    Collection,
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// Bank transfer.
    BankTransfer,
    /// Card.
    Card,
}

/// Payment status.
///
/// Completed is terminal; partial or voided payments are not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Payment has settled.
    Completed,
}

/// An immutable payout or collection record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier.
    pub id: PaymentId,
    /// Human-readable, date-scoped document number.
    pub number: String,
    /// The supplier or customer.
    pub party_id: PartyId,
    /// Payout or collection.
    pub kind: PaymentKind,
    /// Amount moved.
    pub amount: Decimal,
    /// Payment method.
    pub method: PaymentMethod,
    /// Settlement status.
    pub status: PaymentStatus,
    /// Payment date.
    pub paid_on: NaiveDate,
}

impl Payment {
    /// Creates a completed payment record.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NegativeAmount` for a negative amount.
    pub fn new(
        number: impl Into<String>,
        party_id: PartyId,
        kind: PaymentKind,
        amount: Decimal,
        method: PaymentMethod,
        paid_on: NaiveDate,
    ) -> Result<Self, LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        Ok(Self {
            id: PaymentId::new(),
            number: number.into(),
            party_id,
            kind,
            amount,
            method,
            status: PaymentStatus::Completed,
            paid_on,
        })
    }
}

/// Denormalized running account per customer/supplier.
///
/// Invariant: `current_balance` always equals the fold of all ledger and
/// payment postings to date; it is mutated only inside the same atomic
/// operation that writes a new posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The party this account tracks.
    pub party_id: PartyId,
    /// Lifetime total of purchase/sale postings.
    pub total_debit: Decimal,
    /// Lifetime total of completed payouts/collections.
    pub total_credit: Decimal,
    /// `total_debit - total_credit`.
    pub current_balance: Decimal,
    /// Date of the most recent posting of either kind.
    pub last_transaction_on: Option<NaiveDate>,
}

impl Account {
    /// Creates an empty account for a party.
    #[must_use]
    pub fn new(party_id: PartyId) -> Self {
        Self {
            party_id,
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            current_balance: Decimal::ZERO,
            last_transaction_on: None,
        }
    }

    /// Applies a purchase/sale posting.
    pub fn apply_debit(&mut self, amount: Decimal, date: NaiveDate) {
        self.total_debit += amount;
        self.current_balance += amount;
        self.last_transaction_on = Some(date);
    }

    /// Applies a completed payout/collection.
    pub fn apply_credit(&mut self, amount: Decimal, date: NaiveDate) {
        self.total_credit += amount;
        self.current_balance -= amount;
        self.last_transaction_on = Some(date);
    }
}

/// What a statement entry originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementLineKind {
    /// A purchase or sale ledger posting (debit side).
    Ledger(PostingKind),
    /// A payout or collection (credit side).
    Payment(PaymentKind),
}

/// One dated movement feeding statement generation.
#[derive(Debug, Clone)]
pub struct StatementLine {
    /// Movement date.
    pub date: NaiveDate,
    /// Origin of the movement.
    pub kind: StatementLineKind,
    /// Document number of the originating record.
    pub reference: String,
    /// Debit amount (zero for payments).
    pub debit: Decimal,
    /// Credit amount (zero for ledger postings).
    pub credit: Decimal,
}

impl From<&LedgerPosting> for StatementLine {
    fn from(posting: &LedgerPosting) -> Self {
        Self {
            date: posting.posted_on,
            kind: StatementLineKind::Ledger(posting.kind),
            reference: posting.number.clone(),
            debit: posting.total_amount,
            credit: Decimal::ZERO,
        }
    }
}

impl From<&Payment> for StatementLine {
    fn from(payment: &Payment) -> Self {
        Self {
            date: payment.paid_on,
            kind: StatementLineKind::Payment(payment.kind),
            reference: payment.number.clone(),
            debit: Decimal::ZERO,
            credit: payment.amount,
        }
    }
}

/// A replayed statement entry with its running balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementEntry {
    /// Movement date.
    pub date: NaiveDate,
    /// Origin of the movement.
    pub kind: StatementLineKind,
    /// Document number of the originating record.
    pub reference: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Balance after this entry is applied.
    pub running_balance: Decimal,
}

/// A derived periodic statement. Never persisted; regenerated on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    /// The party the statement covers.
    pub party_id: PartyId,
    /// Inclusive period start.
    pub period_start: NaiveDate,
    /// Inclusive period end.
    pub period_end: NaiveDate,
    /// Balance carried in from before the period.
    pub opening_balance: Decimal,
    /// Chronologically replayed entries.
    pub entries: Vec<StatementEntry>,
    /// Sum of in-period debits.
    pub total_debit: Decimal,
    /// Sum of in-period credits.
    pub total_credit: Decimal,
    /// `opening_balance + total_debit - total_credit`.
    pub closing_balance: Decimal,
}
