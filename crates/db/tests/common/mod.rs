//! Shared fixture for database-backed integration tests.
//!
//! A fixture starts a throwaway Postgres container and migrates it, unless it
//! is given a shared one.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::ContainerAsync;
use testcontainers_modules::testcontainers::runners::AsyncRunner;

use tally_core::account::{AccountCategory, CreateAccountInput};
use tally_core::fiscal::FiscalYearWithPeriods;
use tally_core::ledger::{JournalEntryInput, LedgerLineInput, PostedEntry};
use tally_core::{FixedClock, RecordingEventSink};
use tally_db::migration::Migrator;
use tally_db::{CreateFiscalYearInput, Database, Ledger};
use tally_shared::types::{AccountId, FiscalPeriodId, TenantId};
use tally_shared::{DatabaseConfig, LedgerConfig};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A migrated Postgres running in a container for the lifetime of the value.
pub struct TestDatabase {
    pub conn: DatabaseConnection,
    _container: ContainerAsync<Postgres>,
}

impl TestDatabase {
    pub async fn start() -> Self {
        let container = Postgres::default().start().await.unwrap();
        let host = container.get_host().await.unwrap();
        let port = container.get_host_port_ipv4(5432).await.unwrap();
        let config = DatabaseConfig {
            url: format!("postgres://postgres:postgres@{host}:{port}/postgres"),
            ..DatabaseConfig::default()
        };
        let conn = tally_db::connect(&config).await.unwrap();
        Migrator::up(&conn, None).await.unwrap();
        Self {
            conn,
            _container: container,
        }
    }
}

/// A tenant with the standard account types, a small chart of accounts and an
/// open FY2024 of twelve monthly periods. The clock reads 2025-01-15.
pub struct Fixture {
    pub db: Database,
    pub ledger: Ledger,
    pub clock: Arc<FixedClock>,
    pub events: Arc<RecordingEventSink>,
    pub tenant: TenantId,
    pub year: FiscalYearWithPeriods,
    pub cash: AccountId,
    pub receivables: AccountId,
    pub payables: AccountId,
    pub capital: AccountId,
    pub retained_earnings: AccountId,
    pub sales: AccountId,
    pub rent: AccountId,
    pub test_db: Arc<TestDatabase>,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(LedgerConfig::default()).await
    }

    pub async fn with_config(config: LedgerConfig) -> Self {
        Self::on(Arc::new(TestDatabase::start().await), config).await
    }

    /// Builds the fixture for a fresh tenant of an existing database.
    pub async fn on(test_db: Arc<TestDatabase>, config: LedgerConfig) -> Self {
        let clock = Arc::new(FixedClock::new(date(2025, 1, 15)));
        let events = Arc::new(RecordingEventSink::new());
        let db = Database::new(test_db.conn.clone(), config)
            .with_clock(clock.clone())
            .with_event_sink(events.clone());
        let ledger = Ledger::new(&db);
        let tenant = TenantId::new();

        let year = setup_tenant(&ledger, tenant, 2024).await;

        let cash = create(&ledger, tenant, "1000", "Cash", AccountCategory::Asset).await;
        let receivables = create(
            &ledger,
            tenant,
            "1100",
            "Accounts Receivable",
            AccountCategory::Asset,
        )
        .await;
        let payables =
            create(&ledger, tenant, "2000", "Accounts Payable", AccountCategory::Liability).await;
        let capital = create(&ledger, tenant, "3000", "Owner Capital", AccountCategory::Equity).await;
        let retained_earnings =
            create(&ledger, tenant, "3100", "Retained Earnings", AccountCategory::Equity).await;
        let sales = create(&ledger, tenant, "4000", "Sales", AccountCategory::Revenue).await;
        let rent = create(&ledger, tenant, "5000", "Rent Expense", AccountCategory::Expense).await;
        ledger
            .accounts
            .designate_retained_earnings(tenant, retained_earnings)
            .await
            .unwrap();

        Self {
            db,
            ledger,
            clock,
            events,
            tenant,
            year,
            cash,
            receivables,
            payables,
            capital,
            retained_earnings,
            sales,
            rent,
            test_db,
        }
    }

    /// Posts `debit` to one account and `credit` to another.
    pub async fn post(
        &self,
        on: NaiveDate,
        debit: AccountId,
        credit: AccountId,
        amount: Decimal,
    ) -> PostedEntry {
        self.ledger
            .poster
            .post(self.tenant, transfer(on, debit, credit, amount))
            .await
            .unwrap()
    }

    /// Period `n` (1-based) of FY2024.
    pub fn period(&self, n: usize) -> FiscalPeriodId {
        self.year.periods[n - 1].id
    }

    /// Closes periods 1..=n of FY2024 in order.
    pub async fn close_through(&self, n: usize) {
        close_periods(&self.ledger, self.tenant, &self.year, n).await;
    }

    pub async fn balance(&self, account: AccountId, as_of: NaiveDate) -> Decimal {
        self.ledger
            .accounts
            .compute_balance(self.tenant, account, as_of)
            .await
            .unwrap()
    }
}

async fn create(
    ledger: &Ledger,
    tenant: TenantId,
    code: &str,
    name: &str,
    category: AccountCategory,
) -> AccountId {
    ledger
        .accounts
        .create_account(tenant, CreateAccountInput::new(code, name, category.as_str()))
        .await
        .unwrap()
        .account
        .id
}

/// Standard account types and a calendar fiscal year for `tenant`.
pub async fn setup_tenant(ledger: &Ledger, tenant: TenantId, year: i32) -> FiscalYearWithPeriods {
    ledger
        .accounts
        .install_standard_account_types(tenant)
        .await
        .unwrap();
    create_year(ledger, tenant, year).await
}

/// A calendar fiscal year for `tenant`.
pub async fn create_year(ledger: &Ledger, tenant: TenantId, year: i32) -> FiscalYearWithPeriods {
    ledger
        .fiscal
        .create_fiscal_year(
            tenant,
            CreateFiscalYearInput {
                name: format!("FY{year}"),
                start_date: date(year, 1, 1),
                end_date: date(year, 12, 31),
            },
        )
        .await
        .unwrap()
}

/// Closes the first `n` periods of `year` in order.
pub async fn close_periods(
    ledger: &Ledger,
    tenant: TenantId,
    year: &FiscalYearWithPeriods,
    n: usize,
) {
    for period in &year.periods[..n] {
        ledger
            .fiscal
            .close_period(tenant, period.id, false)
            .await
            .unwrap();
    }
}

pub fn transfer(
    on: NaiveDate,
    debit: AccountId,
    credit: AccountId,
    amount: Decimal,
) -> JournalEntryInput {
    JournalEntryInput::new(
        on,
        vec![
            LedgerLineInput::debit(debit, amount),
            LedgerLineInput::credit(credit, amount),
        ],
    )
}
