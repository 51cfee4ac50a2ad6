//! Property-based tests for the matching engine.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{BankAccountId, BankTransactionId, JournalEntryId, LedgerLineId, TenantId};

use super::matching::{LedgerActivity, MatchingEngine};
use super::types::BankTransaction;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn transactions() -> impl Strategy<Value = Vec<BankTransaction>> {
    prop::collection::vec((0i64..20, 1i64..6, prop::option::of(0u8..3)), 0..12).prop_map(|rows| {
        rows.into_iter()
            .zip(1i64..)
            .map(|((day, amount, reference), id)| BankTransaction {
                id: BankTransactionId::from_raw(id),
                tenant_id: TenantId::new(),
                bank_account_id: BankAccountId::new(),
                date: base() + Duration::days(day),
                amount: Decimal::new(amount * 100, 2),
                reference: reference.map(|r| format!("REF-{r}")),
                description: String::new(),
                reconciliation_id: None,
            })
            .collect()
    })
}

fn activity() -> impl Strategy<Value = Vec<LedgerActivity>> {
    prop::collection::vec((0i64..20, 1i64..6, prop::option::of(0u8..3)), 0..12).prop_map(|rows| {
        rows.into_iter()
            .zip(1i64..)
            .map(|((day, amount, reference), id)| LedgerActivity {
                line_id: LedgerLineId::from_raw(id),
                entry_id: JournalEntryId::new(),
                date: base() + Duration::days(day),
                amount: Decimal::from(amount),
                reference: reference.map(|r| format!("REF-{r}")),
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Proposals are one-to-one, respect amount and window, and every bank
    /// transaction lands in exactly one of proposals/contested/unmatched.
    #[test]
    fn prop_assignment_is_one_to_one_and_total(
        txns in transactions(),
        lines in activity(),
        window in 0u32..5,
    ) {
        let result = MatchingEngine::suggest(&txns, &lines, window);

        let mut banks = HashSet::new();
        let mut ledger = HashSet::new();
        for p in &result.proposals {
            prop_assert!(banks.insert(p.candidate.bank_transaction_id));
            prop_assert!(ledger.insert(p.candidate.ledger_line_id));
            prop_assert!(p.candidate.date_delta_days <= window);
            let t = txns.iter().find(|t| t.id == p.candidate.bank_transaction_id).unwrap();
            let l = lines.iter().find(|l| l.line_id == p.candidate.ledger_line_id).unwrap();
            prop_assert_eq!(t.amount, l.amount);
        }

        let total = result.proposals.len() + result.contested.len() + result.unmatched.len();
        prop_assert_eq!(total, txns.len());
    }

    /// The engine is deterministic: shuffled input yields the same result.
    #[test]
    fn prop_deterministic_under_input_order(
        txns in transactions(),
        lines in activity(),
        window in 0u32..5,
    ) {
        let first = MatchingEngine::suggest(&txns, &lines, window);
        let mut reversed_txns = txns.clone();
        reversed_txns.reverse();
        let mut reversed_lines = lines.clone();
        reversed_lines.reverse();
        let second = MatchingEngine::suggest(&reversed_txns, &reversed_lines, window);
        prop_assert_eq!(
            first.proposals.iter().map(|p| p.candidate).collect::<Vec<_>>(),
            second.proposals.iter().map(|p| p.candidate).collect::<Vec<_>>()
        );
        prop_assert_eq!(first.unmatched, second.unmatched);
    }
}
