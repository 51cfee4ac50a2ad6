//! Property-based tests for posting validation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::service::LedgerService;
use super::types::{LedgerLineInput, PostingTotals};
use crate::error::LedgerError;

fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Balanced line sets: debits drawn freely, the credit side split to match.
fn balanced_lines() -> impl Strategy<Value = Vec<LedgerLineInput>> {
    prop::collection::vec(positive_amount(), 1..6).prop_flat_map(|debits| {
        let total: Decimal = debits.iter().copied().sum();
        (Just(debits), 1usize..4).prop_map(move |(debits, splits)| {
            let mut lines: Vec<LedgerLineInput> = debits
                .iter()
                .map(|d| LedgerLineInput::debit(AccountId::new(), *d))
                .collect();
            let cents = total * Decimal::ONE_HUNDRED;
            let piece = (cents / Decimal::from(splits)).floor();
            let mut remaining = total;
            for _ in 1..splits {
                let amount = piece / Decimal::ONE_HUNDRED;
                if amount > Decimal::ZERO && amount < remaining {
                    lines.push(LedgerLineInput::credit(AccountId::new(), amount));
                    remaining -= amount;
                }
            }
            lines.push(LedgerLineInput::credit(AccountId::new(), remaining));
            lines
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any balanced set of one-sided positive lines passes.
    #[test]
    fn prop_balanced_lines_accepted(lines in balanced_lines()) {
        let totals = LedgerService::validate_lines(&lines);
        prop_assert!(totals.is_ok(), "balanced lines rejected: {:?}", totals);
        let totals = totals.unwrap();
        prop_assert_eq!(totals.debit, totals.credit);
    }

    /// Nudging one line by a cent always produces an imbalance error carrying both totals.
    #[test]
    fn prop_one_cent_off_rejected(lines in balanced_lines(), index in any::<prop::sample::Index>()) {
        let mut lines = lines;
        let i = index.index(lines.len());
        if lines[i].debit.is_zero() {
            lines[i].credit += Decimal::new(1, 2);
        } else {
            lines[i].debit += Decimal::new(1, 2);
        }
        let expected = PostingTotals::of(&lines);
        prop_assert_eq!(
            LedgerService::validate_lines(&lines),
            Err(LedgerError::ImbalancedEntry { debit: expected.debit, credit: expected.credit })
        );
    }

    /// A line carrying both a debit and a credit is never accepted.
    #[test]
    fn prop_two_sided_line_rejected(amount in positive_amount(), other in positive_amount()) {
        let account = AccountId::new();
        let lines = vec![
            LedgerLineInput { credit: other, ..LedgerLineInput::debit(account, amount) },
            LedgerLineInput::credit(AccountId::new(), amount - other),
        ];
        prop_assert!(matches!(
            LedgerService::validate_lines(&lines),
            Err(LedgerError::Validation(_))
        ));
    }
}
