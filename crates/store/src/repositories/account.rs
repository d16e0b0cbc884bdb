//! Party accounts, ledger postings, payments, and statement generation.

use std::sync::Arc;

use chrono::NaiveDate;
use provender_core::ledger::{
    Account, LedgerError, LedgerPosting, Payment, PaymentKind, PaymentMethod, PostingItem,
    PostingKind, Statement, StatementBuilder, StatementLine,
};
use provender_core::sequence::SequenceDomain;
use provender_shared::AppError;
use provender_shared::types::PartyId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collections;
use super::sequence::SequenceGenerator;
use crate::engine::{MemoryStore, StoreError};

/// Errors from account and posting operations.
#[derive(Debug, Error)]
pub enum PostingError {
    /// The referenced party does not exist.
    #[error("Party not found: {0}")]
    PartyNotFound(PartyId),

    /// The party exists but has no account document.
    #[error("Account not found for party: {0}")]
    AccountNotFound(PartyId),

    /// A domain-level ledger violation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PostingError> for AppError {
    fn from(err: PostingError) -> Self {
        match err {
            PostingError::PartyNotFound(_) | PostingError::AccountNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            PostingError::Ledger(_) => Self::Validation(err.to_string()),
            PostingError::Store(e) => e.into(),
        }
    }
}

/// Which side of the business a party sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyKind {
    /// A customer we sell to and collect from.
    Customer,
    /// A supplier we buy from and pay out to.
    Supplier,
}

/// A customer or supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    /// Unique identifier.
    pub id: PartyId,
    /// Display name.
    pub name: String,
    /// Customer or supplier.
    pub kind: PartyKind,
}

/// Stores parties, their running accounts, and the immutable posting and
/// payment records behind them.
///
/// Every posting commits together with the account balance it moves: a
/// reader can never observe a posting whose amount is missing from the
/// account, or an account total with no posting behind it.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    store: Arc<MemoryStore>,
    sequences: SequenceGenerator,
}

impl AccountRepository {
    /// Creates a repository over the given store.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        let sequences = SequenceGenerator::new(Arc::clone(&store));
        Self { store, sequences }
    }

    /// Registers a party together with its empty account.
    ///
    /// # Errors
    ///
    /// Returns a storage error on serialization failure.
    pub async fn register_party(
        &self,
        name: impl Into<String>,
        kind: PartyKind,
    ) -> Result<Party, PostingError> {
        let party = Party {
            id: PartyId::new(),
            name: name.into(),
            kind,
        };
        let account = Account::new(party.id);
        self.store
            .transact::<_, PostingError, _>(|txn| {
                txn.put(collections::PARTIES, &party.id.to_string(), &party)?;
                txn.put(collections::ACCOUNTS, &party.id.to_string(), &account)?;
                Ok(())
            })
            .await?;
        Ok(party)
    }

    /// Fetches a party's running account.
    ///
    /// # Errors
    ///
    /// Returns [`PostingError::AccountNotFound`] for an unregistered party.
    pub fn account(&self, party_id: PartyId) -> Result<Account, PostingError> {
        self.store
            .get::<Account>(collections::ACCOUNTS, &party_id.to_string())?
            .ok_or(PostingError::AccountNotFound(party_id))
    }

    /// Posts a purchase or sale ledger entry, debiting the party's account.
    ///
    /// The document number is drawn first; the posting and the updated
    /// account then commit as one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`PostingError::PartyNotFound`] for an unregistered party or
    /// a validation error from the posting lines.
    pub async fn post_ledger(
        &self,
        party_id: PartyId,
        kind: PostingKind,
        posted_on: NaiveDate,
        items: Vec<PostingItem>,
    ) -> Result<LedgerPosting, PostingError> {
        let domain = match kind {
            PostingKind::Purchase => SequenceDomain::PurchaseLedger,
            PostingKind::Sale => SequenceDomain::SaleLedger,
        };
        let number = self.sequences.next(domain, posted_on).await?;

        self.store
            .transact(|txn| {
                if txn
                    .get::<Party>(collections::PARTIES, &party_id.to_string())?
                    .is_none()
                {
                    return Err(PostingError::PartyNotFound(party_id));
                }
                let mut account: Account = txn
                    .get(collections::ACCOUNTS, &party_id.to_string())?
                    .ok_or(PostingError::AccountNotFound(party_id))?;

                let posting =
                    LedgerPosting::new(number.clone(), party_id, kind, posted_on, items.clone());
                account.apply_debit(posting.total_amount, posted_on);

                txn.put(
                    collections::LEDGER_POSTINGS,
                    &posting.id.to_string(),
                    &posting,
                )?;
                txn.put(collections::ACCOUNTS, &party_id.to_string(), &account)?;
                Ok(posting)
            })
            .await
    }

    /// Records a completed payout or collection, crediting the party's
    /// account in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`PostingError::PartyNotFound`] for an unregistered party or
    /// [`LedgerError::NegativeAmount`] for a negative amount.
    pub async fn post_payment(
        &self,
        party_id: PartyId,
        kind: PaymentKind,
        amount: Decimal,
        method: PaymentMethod,
        paid_on: NaiveDate,
    ) -> Result<Payment, PostingError> {
        let domain = match kind {
            PaymentKind::Payout => SequenceDomain::Payout,
            PaymentKind::Collection => SequenceDomain::Collection,
        };
        let number = self.sequences.next(domain, paid_on).await?;

        self.store
            .transact(|txn| {
                if txn
                    .get::<Party>(collections::PARTIES, &party_id.to_string())?
                    .is_none()
                {
                    return Err(PostingError::PartyNotFound(party_id));
                }
                let mut account: Account = txn
                    .get(collections::ACCOUNTS, &party_id.to_string())?
                    .ok_or(PostingError::AccountNotFound(party_id))?;

                let payment =
                    Payment::new(number.clone(), party_id, kind, amount, method, paid_on)?;
                account.apply_credit(payment.amount, paid_on);

                txn.put(collections::PAYMENTS, &payment.id.to_string(), &payment)?;
                txn.put(collections::ACCOUNTS, &party_id.to_string(), &account)?;
                Ok(payment)
            })
            .await
    }

    /// Generates the party's statement over an inclusive period.
    ///
    /// Derived on demand from the posting history; nothing is persisted.
    /// Ledger postings are fed ahead of payments so same-date debits replay
    /// before credits.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidPeriod`] if the period is reversed.
    pub fn statement(
        &self,
        party_id: PartyId,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Statement, PostingError> {
        let mut postings: Vec<LedgerPosting> = self
            .store
            .query::<LedgerPosting>(collections::LEDGER_POSTINGS)?
            .into_iter()
            .filter(|p| p.party_id == party_id)
            .collect();
        postings.sort_by(|a, b| a.number.cmp(&b.number));

        let mut payments: Vec<Payment> = self
            .store
            .query::<Payment>(collections::PAYMENTS)?
            .into_iter()
            .filter(|p| p.party_id == party_id)
            .collect();
        payments.sort_by(|a, b| a.number.cmp(&b.number));

        let lines: Vec<StatementLine> = postings
            .iter()
            .map(StatementLine::from)
            .chain(payments.iter().map(StatementLine::from))
            .collect();

        Ok(StatementBuilder::build(
            party_id,
            period_start,
            period_end,
            lines,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provender_core::ledger::StatementLineKind;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn repo() -> AccountRepository {
        AccountRepository::new(Arc::new(MemoryStore::new(200, 64)))
    }

    fn box_of(name: &str, quantity: i64, unit_price: Decimal) -> PostingItem {
        PostingItem::new(name, None, quantity, unit_price).unwrap()
    }

    #[tokio::test]
    async fn test_register_creates_empty_account() {
        let repo = repo();
        let party = repo
            .register_party("Sunrise Farm", PartyKind::Supplier)
            .await
            .unwrap();
        let account = repo.account(party.id).unwrap();
        assert_eq!(account.current_balance, dec!(0));
        assert!(account.last_transaction_on.is_none());
    }

    #[tokio::test]
    async fn test_posting_debits_account_atomically() {
        let repo = repo();
        let party = repo
            .register_party("Sunrise Farm", PartyKind::Supplier)
            .await
            .unwrap();

        let posting = repo
            .post_ledger(
                party.id,
                PostingKind::Purchase,
                date(2025, 3, 10),
                vec![box_of("Napa cabbage", 50, dec!(2000))],
            )
            .await
            .unwrap();
        assert_eq!(posting.total_amount, dec!(100000));
        assert_eq!(posting.number, "PL-250310-001");

        let account = repo.account(party.id).unwrap();
        assert_eq!(account.total_debit, dec!(100000));
        assert_eq!(account.current_balance, dec!(100000));
        assert_eq!(account.last_transaction_on, Some(date(2025, 3, 10)));
    }

    #[tokio::test]
    async fn test_payment_credits_account() {
        let repo = repo();
        let party = repo
            .register_party("Sunrise Farm", PartyKind::Supplier)
            .await
            .unwrap();
        repo.post_ledger(
            party.id,
            PostingKind::Purchase,
            date(2025, 3, 10),
            vec![box_of("Napa cabbage", 50, dec!(2000))],
        )
        .await
        .unwrap();

        let payment = repo
            .post_payment(
                party.id,
                PaymentKind::Payout,
                dec!(40000),
                PaymentMethod::BankTransfer,
                date(2025, 3, 12),
            )
            .await
            .unwrap();
        assert_eq!(payment.number, "PAY-250312-001");

        let account = repo.account(party.id).unwrap();
        assert_eq!(account.current_balance, dec!(60000));
        assert_eq!(account.last_transaction_on, Some(date(2025, 3, 12)));
    }

    #[tokio::test]
    async fn test_posting_to_unknown_party_fails() {
        let repo = repo();
        let ghost = PartyId::new();
        let result = repo
            .post_ledger(
                ghost,
                PostingKind::Sale,
                date(2025, 3, 10),
                vec![box_of("Daikon", 1, dec!(500))],
            )
            .await;
        assert!(matches!(result, Err(PostingError::PartyNotFound(id)) if id == ghost));
    }

    #[tokio::test]
    async fn test_statement_replays_running_balance() {
        let repo = repo();
        let party = repo
            .register_party("Sunrise Farm", PartyKind::Supplier)
            .await
            .unwrap();

        repo.post_ledger(
            party.id,
            PostingKind::Purchase,
            date(2025, 3, 10),
            vec![box_of("Napa cabbage", 50, dec!(2000))],
        )
        .await
        .unwrap();
        repo.post_payment(
            party.id,
            PaymentKind::Payout,
            dec!(40000),
            PaymentMethod::Cash,
            date(2025, 3, 12),
        )
        .await
        .unwrap();

        let statement = repo
            .statement(party.id, date(2025, 3, 1), date(2025, 3, 31))
            .unwrap();
        assert_eq!(statement.opening_balance, dec!(0));
        assert_eq!(statement.entries.len(), 2);
        assert_eq!(statement.entries[0].running_balance, dec!(100000));
        assert_eq!(statement.entries[1].running_balance, dec!(60000));
        assert_eq!(statement.closing_balance, dec!(60000));
    }

    #[tokio::test]
    async fn test_statement_opening_balance_folds_prior_activity() {
        let repo = repo();
        let party = repo
            .register_party("Harbor Fishery", PartyKind::Supplier)
            .await
            .unwrap();

        repo.post_ledger(
            party.id,
            PostingKind::Purchase,
            date(2025, 2, 20),
            vec![box_of("Mackerel", 30, dec!(1000))],
        )
        .await
        .unwrap();
        repo.post_payment(
            party.id,
            PaymentKind::Payout,
            dec!(10000),
            PaymentMethod::Cash,
            date(2025, 3, 5),
        )
        .await
        .unwrap();

        let statement = repo
            .statement(party.id, date(2025, 3, 1), date(2025, 3, 31))
            .unwrap();
        assert_eq!(statement.opening_balance, dec!(30000));
        assert_eq!(statement.entries.len(), 1);
        assert_eq!(statement.closing_balance, dec!(20000));
    }

    #[tokio::test]
    async fn test_statement_same_date_debit_before_credit() {
        let repo = repo();
        let party = repo
            .register_party("Green Grocer", PartyKind::Customer)
            .await
            .unwrap();

        repo.post_payment(
            party.id,
            PaymentKind::Collection,
            dec!(5000),
            PaymentMethod::Card,
            date(2025, 3, 10),
        )
        .await
        .unwrap();
        repo.post_ledger(
            party.id,
            PostingKind::Sale,
            date(2025, 3, 10),
            vec![box_of("Daikon", 10, dec!(800))],
        )
        .await
        .unwrap();

        let statement = repo
            .statement(party.id, date(2025, 3, 1), date(2025, 3, 31))
            .unwrap();
        // Same-date entries replay debit first regardless of posting order.
        assert!(matches!(
            statement.entries[0].kind,
            StatementLineKind::Ledger(PostingKind::Sale)
        ));
        assert_eq!(statement.entries[0].running_balance, dec!(8000));
        assert_eq!(statement.entries[1].running_balance, dec!(3000));
    }

    #[tokio::test]
    async fn test_reversed_period_is_rejected() {
        let repo = repo();
        let party = repo
            .register_party("Green Grocer", PartyKind::Customer)
            .await
            .unwrap();
        let result = repo.statement(party.id, date(2025, 4, 1), date(2025, 3, 1));
        assert!(matches!(
            result,
            Err(PostingError::Ledger(LedgerError::InvalidPeriod { .. }))
        ));
    }
}
