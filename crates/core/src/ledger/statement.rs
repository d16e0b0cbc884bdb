//! Statement generation: chronological replay of postings into a running
//! balance.

use chrono::NaiveDate;
use provender_shared::types::PartyId;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{Statement, StatementEntry, StatementLine};

/// Builds periodic statements from posting history.
///
/// Pure logic: the store layer queries the party's postings and payments and
/// hands them over as [`StatementLine`]s; everything before the period folds
/// into the opening balance, everything inside it is replayed in date order.
pub struct StatementBuilder;

impl StatementBuilder {
    /// Generates the statement for `party_id` over the inclusive period.
    ///
    /// `lines` may span any date range; lines after `period_end` are ignored.
    /// The sort is stable, so same-date lines keep the order the store layer
    /// supplies them in (ledger postings ahead of payments).
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidPeriod` if `period_start > period_end`.
    pub fn build(
        party_id: PartyId,
        period_start: NaiveDate,
        period_end: NaiveDate,
        lines: Vec<StatementLine>,
    ) -> Result<Statement, LedgerError> {
        if period_start > period_end {
            return Err(LedgerError::InvalidPeriod {
                start: period_start,
                end: period_end,
            });
        }

        let opening_balance: Decimal = lines
            .iter()
            .filter(|l| l.date < period_start)
            .map(|l| l.debit - l.credit)
            .sum();

        let mut in_period: Vec<StatementLine> = lines
            .into_iter()
            .filter(|l| l.date >= period_start && l.date <= period_end)
            .collect();
        in_period.sort_by_key(|l| l.date);

        let mut running_balance = opening_balance;
        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;

        let entries = in_period
            .into_iter()
            .map(|line| {
                running_balance += line.debit - line.credit;
                total_debit += line.debit;
                total_credit += line.credit;
                StatementEntry {
                    date: line.date,
                    kind: line.kind,
                    reference: line.reference,
                    debit: line.debit,
                    credit: line.credit,
                    running_balance,
                }
            })
            .collect();

        Ok(Statement {
            party_id,
            period_start,
            period_end,
            opening_balance,
            entries,
            total_debit,
            total_credit,
            closing_balance: opening_balance + total_debit - total_credit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{PaymentKind, PostingKind, StatementLineKind};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn debit(d: NaiveDate, amount: Decimal, reference: &str) -> StatementLine {
        StatementLine {
            date: d,
            kind: StatementLineKind::Ledger(PostingKind::Purchase),
            reference: reference.to_string(),
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    fn credit(d: NaiveDate, amount: Decimal, reference: &str) -> StatementLine {
        StatementLine {
            date: d,
            kind: StatementLineKind::Payment(PaymentKind::Payout),
            reference: reference.to_string(),
            debit: Decimal::ZERO,
            credit: amount,
        }
    }

    #[test]
    fn test_purchase_then_payout_running_balance() {
        let start = date(2025, 2, 1);
        let end = date(2025, 2, 28);
        let lines = vec![
            debit(date(2025, 2, 3), dec!(100_000), "PL-250203-001"),
            credit(date(2025, 2, 10), dec!(40_000), "PAY-250210-001"),
        ];

        let statement =
            StatementBuilder::build(PartyId::new(), start, end, lines).unwrap();

        assert_eq!(statement.opening_balance, Decimal::ZERO);
        assert_eq!(statement.entries.len(), 2);
        assert_eq!(statement.entries[0].running_balance, dec!(100_000));
        assert_eq!(statement.entries[1].running_balance, dec!(60_000));
        assert_eq!(statement.total_debit, dec!(100_000));
        assert_eq!(statement.total_credit, dec!(40_000));
        assert_eq!(statement.closing_balance, dec!(60_000));
    }

    #[test]
    fn test_pre_period_lines_fold_into_opening_balance() {
        let lines = vec![
            debit(date(2025, 1, 5), dec!(70_000), "PL-250105-001"),
            credit(date(2025, 1, 20), dec!(20_000), "PAY-250120-001"),
            debit(date(2025, 2, 2), dec!(10_000), "PL-250202-001"),
        ];

        let statement =
            StatementBuilder::build(PartyId::new(), date(2025, 2, 1), date(2025, 2, 28), lines)
                .unwrap();

        assert_eq!(statement.opening_balance, dec!(50_000));
        assert_eq!(statement.entries.len(), 1);
        assert_eq!(statement.closing_balance, dec!(60_000));
    }

    #[test]
    fn test_post_period_lines_are_ignored() {
        let lines = vec![
            debit(date(2025, 2, 2), dec!(10_000), "PL-250202-001"),
            debit(date(2025, 3, 1), dec!(99_000), "PL-250301-001"),
        ];

        let statement =
            StatementBuilder::build(PartyId::new(), date(2025, 2, 1), date(2025, 2, 28), lines)
                .unwrap();

        assert_eq!(statement.entries.len(), 1);
        assert_eq!(statement.total_debit, dec!(10_000));
    }

    #[test]
    fn test_entries_sorted_by_date() {
        let lines = vec![
            credit(date(2025, 2, 20), dec!(5_000), "PAY-250220-001"),
            debit(date(2025, 2, 3), dec!(10_000), "PL-250203-001"),
            debit(date(2025, 2, 15), dec!(2_000), "PL-250215-001"),
        ];

        let statement =
            StatementBuilder::build(PartyId::new(), date(2025, 2, 1), date(2025, 2, 28), lines)
                .unwrap();

        let dates: Vec<_> = statement.entries.iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![date(2025, 2, 3), date(2025, 2, 15), date(2025, 2, 20)]
        );
        assert_eq!(statement.entries[2].running_balance, dec!(7_000));
    }

    #[test]
    fn test_same_date_keeps_supplied_order() {
        // Stable sort: the ledger posting supplied first replays first.
        let d = date(2025, 2, 10);
        let lines = vec![
            debit(d, dec!(100_000), "PL-250210-001"),
            credit(d, dec!(40_000), "PAY-250210-001"),
        ];

        let statement =
            StatementBuilder::build(PartyId::new(), date(2025, 2, 1), date(2025, 2, 28), lines)
                .unwrap();

        assert_eq!(statement.entries[0].running_balance, dec!(100_000));
        assert_eq!(statement.entries[1].running_balance, dec!(60_000));
    }

    #[test]
    fn test_empty_period_closing_equals_opening() {
        let lines = vec![debit(date(2025, 1, 5), dec!(70_000), "PL-250105-001")];

        let statement =
            StatementBuilder::build(PartyId::new(), date(2025, 2, 1), date(2025, 2, 28), lines)
                .unwrap();

        assert!(statement.entries.is_empty());
        assert_eq!(statement.opening_balance, dec!(70_000));
        assert_eq!(statement.closing_balance, dec!(70_000));
    }

    #[test]
    fn test_rejects_inverted_period() {
        let result = StatementBuilder::build(
            PartyId::new(),
            date(2025, 3, 1),
            date(2025, 2, 1),
            vec![],
        );
        assert!(matches!(result, Err(LedgerError::InvalidPeriod { .. })));
    }
}

#[cfg(test)]
#[path = "statement_props.rs"]
mod props;
