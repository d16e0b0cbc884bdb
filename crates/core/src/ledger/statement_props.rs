//! Property tests for statement generation.

use chrono::NaiveDate;
use proptest::prelude::*;
use provender_shared::types::PartyId;
use rust_decimal::Decimal;

use super::StatementBuilder;
use crate::ledger::types::{PaymentKind, PostingKind, StatementLine, StatementLineKind};

/// (day-of-year offset, amount, is_credit)
fn lines_strategy() -> impl Strategy<Value = Vec<(u16, i64, bool)>> {
    prop::collection::vec((0u16..300, 0i64..1_000_000, any::<bool>()), 0..40)
}

fn build_lines(spec: &[(u16, i64, bool)]) -> Vec<StatementLine> {
    let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    spec.iter()
        .map(|&(offset, amount, is_credit)| {
            let date = base + chrono::Days::new(u64::from(offset));
            if is_credit {
                StatementLine {
                    date,
                    kind: StatementLineKind::Payment(PaymentKind::Collection),
                    reference: format!("COL-{offset}"),
                    debit: Decimal::ZERO,
                    credit: Decimal::from(amount),
                }
            } else {
                StatementLine {
                    date,
                    kind: StatementLineKind::Ledger(PostingKind::Sale),
                    reference: format!("SL-{offset}"),
                    debit: Decimal::from(amount),
                    credit: Decimal::ZERO,
                }
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// closing == opening + total_debit - total_credit, and equals the last
    /// entry's running balance (or the opening balance with no entries).
    #[test]
    fn prop_closing_balance_identity(spec in lines_strategy()) {
        let start = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();

        let statement = StatementBuilder::build(
            PartyId::new(),
            start,
            end,
            build_lines(&spec),
        ).unwrap();

        prop_assert_eq!(
            statement.closing_balance,
            statement.opening_balance + statement.total_debit - statement.total_credit
        );
        let last = statement
            .entries
            .last()
            .map_or(statement.opening_balance, |e| e.running_balance);
        prop_assert_eq!(statement.closing_balance, last);
    }

    /// Every entry's running balance is the previous balance plus its own
    /// debit minus its own credit.
    #[test]
    fn prop_running_balance_chain(spec in lines_strategy()) {
        let start = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();

        let statement = StatementBuilder::build(
            PartyId::new(),
            start,
            end,
            build_lines(&spec),
        ).unwrap();

        let mut previous = statement.opening_balance;
        for entry in &statement.entries {
            prop_assert_eq!(entry.running_balance, previous + entry.debit - entry.credit);
            previous = entry.running_balance;
        }
    }

    /// Entries are non-decreasing in date and all fall inside the period.
    #[test]
    fn prop_entries_sorted_and_in_period(spec in lines_strategy()) {
        let start = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();

        let statement = StatementBuilder::build(
            PartyId::new(),
            start,
            end,
            build_lines(&spec),
        ).unwrap();

        for pair in statement.entries.windows(2) {
            prop_assert!(pair[0].date <= pair[1].date);
        }
        for entry in &statement.entries {
            prop_assert!(entry.date >= start && entry.date <= end);
        }
    }

    /// The split point between opening balance and entries never loses a
    /// line: opening + in-period movement covers every pre-end line exactly
    /// once.
    #[test]
    fn prop_no_line_lost_or_double_counted(spec in lines_strategy()) {
        let start = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();
        let lines = build_lines(&spec);

        let expected: Decimal = lines
            .iter()
            .filter(|l| l.date <= end)
            .map(|l| l.debit - l.credit)
            .sum();

        let statement =
            StatementBuilder::build(PartyId::new(), start, end, lines).unwrap();

        prop_assert_eq!(statement.closing_balance, expected);
    }
}
