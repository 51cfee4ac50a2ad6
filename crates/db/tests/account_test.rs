//! AccountRegistry integration tests.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{Fixture, date};
use tally_core::LedgerError;
use tally_core::account::{
    AccountCategory, AccountFilter, AccountTypeInput, CreateAccountInput, NormalBalance,
    OpeningBalance, UpdateAccountInput,
};
use tally_core::ledger::EntrySource;
use tally_shared::types::TenantId;

#[tokio::test]
async fn test_duplicate_code_rejected() {
    let fx = Fixture::new().await;
    let err = fx
        .ledger
        .accounts
        .create_account(fx.tenant, CreateAccountInput::new("1000", "Petty Cash", "asset"))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::DuplicateCode("1000".to_string()));
}

#[tokio::test]
async fn test_same_code_allowed_in_other_tenant() {
    let fx = Fixture::new().await;
    let other = TenantId::new();
    fx.ledger
        .accounts
        .install_standard_account_types(other)
        .await
        .unwrap();
    let created = fx
        .ledger
        .accounts
        .create_account(other, CreateAccountInput::new("1000", "Cash", "asset"))
        .await
        .unwrap();
    assert_eq!(created.account.tenant_id, other);
}

#[tokio::test]
async fn test_unknown_account_type_rejected() {
    let fx = Fixture::new().await;
    let err = fx
        .ledger
        .accounts
        .create_account(fx.tenant, CreateAccountInput::new("9000", "Odd", "contra_asset"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { entity: "account type", .. }));
}

#[tokio::test]
async fn test_parent_in_other_tenant_is_cycle_error() {
    let fx = Fixture::new().await;
    let other = TenantId::new();
    fx.ledger
        .accounts
        .install_standard_account_types(other)
        .await
        .unwrap();
    let err = fx
        .ledger
        .accounts
        .create_account(
            other,
            CreateAccountInput::new("1010", "Till", "asset").with_parent(fx.cash),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Cycle { parent_id, .. } if parent_id == fx.cash));
}

#[tokio::test]
async fn test_reparenting_under_own_descendant_is_cycle_error() {
    let fx = Fixture::new().await;
    let assets = fx
        .ledger
        .accounts
        .create_account(fx.tenant, CreateAccountInput::new("1", "Assets", "asset").header())
        .await
        .unwrap()
        .account;
    let current = fx
        .ledger
        .accounts
        .create_account(
            fx.tenant,
            CreateAccountInput::new("10", "Current Assets", "asset")
                .header()
                .with_parent(assets.id),
        )
        .await
        .unwrap()
        .account;

    let err = fx
        .ledger
        .accounts
        .update_account(
            fx.tenant,
            assets.id,
            UpdateAccountInput {
                parent_id: Some(Some(current.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Cycle { .. }));
}

#[tokio::test]
async fn test_header_balance_aggregates_subtree() {
    let fx = Fixture::new().await;
    let assets = fx
        .ledger
        .accounts
        .create_account(fx.tenant, CreateAccountInput::new("1", "Assets", "asset").header())
        .await
        .unwrap()
        .account;
    for id in [fx.cash, fx.receivables] {
        fx.ledger
            .accounts
            .update_account(
                fx.tenant,
                id,
                UpdateAccountInput {
                    parent_id: Some(Some(assets.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    fx.post(date(2024, 1, 10), fx.cash, fx.capital, dec!(1000.00)).await;
    fx.post(date(2024, 1, 20), fx.receivables, fx.sales, dec!(250.00)).await;
    fx.post(date(2024, 2, 5), fx.cash, fx.receivables, dec!(100.00)).await;

    assert_eq!(fx.balance(assets.id, date(2024, 1, 31)).await, dec!(1250.00));
    assert_eq!(fx.balance(assets.id, date(2024, 2, 28)).await, dec!(1250.00));
    assert_eq!(fx.balance(fx.receivables, date(2024, 2, 28)).await, dec!(150.00));
    assert_eq!(fx.balance(fx.cash, date(2024, 1, 9)).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_header_account_rejects_postings() {
    let fx = Fixture::new().await;
    let header = fx
        .ledger
        .accounts
        .create_account(fx.tenant, CreateAccountInput::new("1", "Assets", "asset").header())
        .await
        .unwrap()
        .account;
    let err = fx
        .ledger
        .poster
        .post(
            fx.tenant,
            common::transfer(date(2024, 3, 1), header.id, fx.capital, dec!(10)),
        )
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::HeaderAccountNotPostable(header.id));
}

#[tokio::test]
async fn test_opening_balance_posts_balanced_entry() {
    let fx = Fixture::new().await;
    let created = fx
        .ledger
        .accounts
        .create_account(
            fx.tenant,
            CreateAccountInput::new("2100", "Bank Loan", "liability").with_opening_balance(
                OpeningBalance {
                    amount: dec!(5000.00),
                    offset_account_id: fx.capital,
                    date: date(2024, 1, 1),
                },
            ),
        )
        .await
        .unwrap();

    let entry = created.opening_entry.unwrap();
    assert_eq!(entry.entry.source, EntrySource::OpeningBalance);
    assert_eq!(created.account.current_balance, dec!(5000.00));
    assert_eq!(fx.balance(created.account.id, date(2024, 1, 1)).await, dec!(5000.00));
    assert_eq!(fx.balance(fx.capital, date(2024, 1, 1)).await, dec!(-5000.00));

    let totals = fx.ledger.reports.ledger_totals().await.unwrap();
    assert!(totals.is_balanced);
}

#[tokio::test]
async fn test_opening_balance_failure_leaves_no_account() {
    let fx = Fixture::new().await;
    let err = fx
        .ledger
        .accounts
        .create_account(
            fx.tenant,
            CreateAccountInput::new("1200", "Inventory", "asset").with_opening_balance(
                OpeningBalance {
                    amount: dec!(300),
                    offset_account_id: fx.capital,
                    date: date(2023, 12, 31),
                },
            ),
        )
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NoFiscalPeriod(date(2023, 12, 31)));
    assert!(
        fx.ledger
            .accounts
            .get_account_by_code(fx.tenant, "1200")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_deactivate_refuses_non_zero_balance() {
    let fx = Fixture::new().await;
    fx.post(date(2024, 1, 10), fx.cash, fx.capital, dec!(1)).await;
    let err = fx
        .ledger
        .accounts
        .deactivate(fx.tenant, fx.cash)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountInUse { account_id, .. } if account_id == fx.cash));
}

#[tokio::test]
async fn test_deactivate_refuses_active_descendants() {
    let fx = Fixture::new().await;
    let parent = fx
        .ledger
        .accounts
        .create_account(fx.tenant, CreateAccountInput::new("6", "Overheads", "expense").header())
        .await
        .unwrap()
        .account;
    let child = fx
        .ledger
        .accounts
        .create_account(
            fx.tenant,
            CreateAccountInput::new("6100", "Utilities", "expense").with_parent(parent.id),
        )
        .await
        .unwrap()
        .account;

    assert!(matches!(
        fx.ledger.accounts.deactivate(fx.tenant, parent.id).await,
        Err(LedgerError::AccountInUse { .. })
    ));

    fx.ledger.accounts.deactivate(fx.tenant, child.id).await.unwrap();
    let parent = fx.ledger.accounts.deactivate(fx.tenant, parent.id).await.unwrap();
    assert!(!parent.is_active);
}

#[tokio::test]
async fn test_inactive_account_rejects_postings() {
    let fx = Fixture::new().await;
    fx.ledger.accounts.deactivate(fx.tenant, fx.payables).await.unwrap();
    let err = fx
        .ledger
        .poster
        .post(
            fx.tenant,
            common::transfer(date(2024, 3, 1), fx.rent, fx.payables, dec!(10)),
        )
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::AccountInactive(fx.payables));
}

#[tokio::test]
async fn test_account_type_locked_once_referenced() {
    let fx = Fixture::new().await;
    let err = fx
        .ledger
        .accounts
        .update_account_type(fx.tenant, "asset", AccountCategory::Asset, Some(NormalBalance::Credit))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::AccountTypeInUse("asset".to_string()));

    fx.ledger
        .accounts
        .define_account_type(
            fx.tenant,
            AccountTypeInput {
                code: "contra_asset".to_string(),
                category: AccountCategory::Asset,
                normal_balance: Some(NormalBalance::Credit),
            },
        )
        .await
        .unwrap();
    let updated = fx
        .ledger
        .accounts
        .update_account_type(fx.tenant, "contra_asset", AccountCategory::Asset, None)
        .await
        .unwrap();
    assert_eq!(updated.normal_balance, NormalBalance::Debit);
}

#[tokio::test]
async fn test_header_flag_refused_after_postings() {
    let fx = Fixture::new().await;
    fx.post(date(2024, 1, 10), fx.cash, fx.capital, dec!(5)).await;
    let err = fx
        .ledger
        .accounts
        .update_account(
            fx.tenant,
            fx.cash,
            UpdateAccountInput {
                is_header: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[tokio::test]
async fn test_code_change_updates_lookup() {
    let fx = Fixture::new().await;
    fx.ledger
        .accounts
        .update_account(
            fx.tenant,
            fx.rent,
            UpdateAccountInput {
                code: Some("5100".to_string()),
                name: Some("Office Rent".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let renamed = fx
        .ledger
        .accounts
        .get_account_by_code(fx.tenant, "5100")
        .await
        .unwrap();
    assert_eq!(renamed.id, fx.rent);
    assert_eq!(renamed.name, "Office Rent");
    assert!(fx.ledger.accounts.get_account_by_code(fx.tenant, "5000").await.is_err());

    fx.ledger
        .accounts
        .create_account(fx.tenant, CreateAccountInput::new("5000", "Wages", "expense"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_accounts_filters_and_orders_by_code() {
    let fx = Fixture::new().await;
    let equity = fx
        .ledger
        .accounts
        .list_accounts(
            fx.tenant,
            &AccountFilter {
                category: Some(AccountCategory::Equity),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let codes: Vec<&str> = equity.iter().map(|a| a.code.as_str()).collect();
    assert_eq!(codes, ["3000", "3100"]);

    let all = fx
        .ledger
        .accounts
        .list_accounts(fx.tenant, &AccountFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 7);
    assert!(all.windows(2).all(|w| w[0].code < w[1].code));
}

#[tokio::test]
async fn test_retained_earnings_must_be_equity() {
    let fx = Fixture::new().await;
    let err = fx
        .ledger
        .accounts
        .designate_retained_earnings(fx.tenant, fx.cash)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(
        fx.ledger.accounts.retained_earnings(fx.tenant).await.unwrap(),
        Some(fx.retained_earnings)
    );
}

#[tokio::test]
async fn test_get_account_is_tenant_scoped() {
    let fx = Fixture::new().await;
    let err = fx
        .ledger
        .accounts
        .get_account(TenantId::new(), fx.cash)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::UnknownAccount(fx.cash));
}
