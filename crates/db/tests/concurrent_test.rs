//! Concurrent access tests.
//!
//! Verifies that:
//! - Concurrent postings on the same accounts produce the correct final balance
//! - Running balances and versions form an unbroken chain
//! - Readers never observe a half-applied entry
//! - Racing reconciliations never reconcile the same item twice

#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::items_after_statements)]

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Barrier;

mod common;

use common::{Fixture, date, setup_tenant, transfer};
use tally_core::LedgerError;
use tally_core::account::CreateAccountInput;
use tally_core::bank::{MatchPair, RegisterBankAccountInput, StatementLineInput};
use tally_shared::types::TenantId;

const TASKS: usize = 8;
const POSTS_PER_TASK: usize = 50;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_postings_correct_balance() {
    let fx = Fixture::new().await;
    let barrier = Arc::new(Barrier::new(TASKS));

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let poster = fx.ledger.poster.clone();
            let barrier = Arc::clone(&barrier);
            let (tenant, rent, cash) = (fx.tenant, fx.rent, fx.cash);
            tokio::spawn(async move {
                barrier.wait().await;
                for i in 0..POSTS_PER_TASK {
                    let day = u32::try_from(i % 28).unwrap() + 1;
                    poster
                        .post(tenant, transfer(date(2024, 6, day), rent, cash, dec!(1.01)))
                        .await
                        .unwrap();
                }
            })
        })
        .collect();
    for result in join_all(handles).await {
        result.unwrap();
    }

    let count = Decimal::from(TASKS * POSTS_PER_TASK);
    let rent = fx.ledger.accounts.get_account(fx.tenant, fx.rent).await.unwrap();
    let cash = fx.ledger.accounts.get_account(fx.tenant, fx.cash).await.unwrap();
    assert_eq!(rent.current_balance, dec!(1.01) * count);
    assert_eq!(cash.current_balance, dec!(-1.01) * count);
    assert_eq!(rent.version, (TASKS * POSTS_PER_TASK) as i64);

    let lines = fx.ledger.poster.account_lines(fx.tenant, fx.rent).await.unwrap();
    let mut expected = Decimal::ZERO;
    for (i, line) in lines.iter().enumerate() {
        expected += dec!(1.01);
        assert_eq!(line.account_version, i as i64 + 1);
        assert_eq!(line.running_balance, expected);
    }

    let numbers: HashSet<i64> = fx
        .ledger
        .poster
        .list_entries(fx.tenant, None, None)
        .await
        .unwrap()
        .iter()
        .map(|e| e.entry_number)
        .collect();
    assert_eq!(numbers.len(), TASKS * POSTS_PER_TASK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_global_equation_holds_across_tenants_under_load() {
    let fx = Fixture::new().await;
    let other = TenantId::new();
    setup_tenant(&fx.ledger, other, 2024).await;
    let bank = fx
        .ledger
        .accounts
        .create_account(other, CreateAccountInput::new("1000", "Bank", "asset"))
        .await
        .unwrap()
        .account
        .id;
    let income = fx
        .ledger
        .accounts
        .create_account(other, CreateAccountInput::new("4000", "Fees", "revenue"))
        .await
        .unwrap()
        .account
        .id;

    let barrier = Arc::new(Barrier::new(TASKS + 1));
    let writers: Vec<_> = (0..TASKS)
        .map(|n| {
            let poster = fx.ledger.poster.clone();
            let barrier = Arc::clone(&barrier);
            let (tenant, cash, sales) = (fx.tenant, fx.cash, fx.sales);
            tokio::spawn(async move {
                barrier.wait().await;
                for i in 0..POSTS_PER_TASK {
                    let amount = Decimal::new((n * 100 + i) as i64 + 1, 2);
                    if n % 2 == 0 {
                        poster
                            .post(tenant, transfer(date(2024, 3, 1), cash, sales, amount))
                            .await
                            .unwrap();
                    } else {
                        poster
                            .post(other, transfer(date(2024, 3, 1), bank, income, amount))
                            .await
                            .unwrap();
                    }
                    if i % 10 == 0 {
                        let mut bad = transfer(date(2024, 3, 1), cash, sales, amount);
                        bad.lines[1].credit += dec!(0.01);
                        assert!(matches!(
                            poster.post(tenant, bad).await,
                            Err(LedgerError::ImbalancedEntry { .. })
                        ));
                    }
                }
            })
        })
        .collect();

    let reader = {
        let reports = fx.ledger.reports.clone();
        let barrier = Arc::clone(&barrier);
        let tenant = fx.tenant;
        tokio::spawn(async move {
            barrier.wait().await;
            for _ in 0..50 {
                let totals = reports.ledger_totals().await.unwrap();
                assert!(totals.is_balanced);
                let report = reports
                    .trial_balance(tenant, date(2024, 12, 31), true)
                    .await
                    .unwrap();
                assert!(report.totals.is_balanced);
            }
        })
    };

    for result in join_all(writers).await {
        result.unwrap();
    }
    reader.await.unwrap();

    let totals = fx.ledger.reports.ledger_totals().await.unwrap();
    assert!(totals.is_balanced);
    assert_eq!(
        fx.balance(fx.cash, date(2024, 12, 31)).await,
        fx.balance(fx.sales, date(2024, 12, 31)).await
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_reconciliations_apply_once() {
    let fx = Fixture::new().await;
    let bank = fx
        .ledger
        .bank
        .register_bank_account(
            fx.tenant,
            RegisterBankAccountInput {
                name: "Operating".to_string(),
                ledger_account_id: fx.cash,
                opening_balance: Decimal::ZERO,
            },
        )
        .await
        .unwrap();
    let line = fx
        .post(date(2024, 3, 4), fx.cash, fx.sales, dec!(500))
        .await
        .lines[0]
        .id;
    let txn = fx
        .ledger
        .bank
        .import_statement_lines(
            fx.tenant,
            bank.id,
            vec![StatementLineInput::new(date(2024, 3, 4), dec!(500), "Deposit")],
        )
        .await
        .unwrap()[0]
        .id;
    let pair = MatchPair {
        bank_transaction_id: txn,
        ledger_line_id: line,
    };

    let barrier = Arc::new(Barrier::new(TASKS));
    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let sessions = fx.ledger.reconciliations.clone();
            let barrier = Arc::clone(&barrier);
            let (tenant, bank_id) = (fx.tenant, bank.id);
            tokio::spawn(async move {
                let session = sessions
                    .start(tenant, bank_id, dec!(500), date(2024, 3, 31))
                    .await
                    .unwrap();
                barrier.wait().await;
                sessions.apply_matches(tenant, session.id, &[pair]).await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, LedgerError::AlreadyReconciled { .. }))
    );
}
