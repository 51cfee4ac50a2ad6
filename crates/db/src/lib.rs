//! Database layer with `SeaORM` entities and the ledger repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions and migrations
//! - Units of work over `PostgreSQL` transactions
//! - Repositories implementing the ledger operations per component
//! - [`Ledger`], a bundle of every component over one database

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod store;

mod mapping;
mod queries;

pub use repositories::{
    AccountRegistry, BankStatementMatcher, CreateFiscalYearInput, CreatedAccount,
    FiscalPeriodManager, LedgerPoster, ReconciliationSessions, TrialBalanceCalculator,
    YearEndCloser,
};
pub use store::{Database, Transaction};

use std::time::Duration;

use sea_orm::{ConnectOptions, DatabaseConnection, DbErr};
use tally_shared::DatabaseConfig;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    sea_orm::Database::connect(options).await
}

/// Every ledger component, sharing one database.
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Chart of accounts.
    pub accounts: AccountRegistry,
    /// Journal posting.
    pub poster: LedgerPoster,
    /// Trial balance and income reporting.
    pub reports: TrialBalanceCalculator,
    /// Fiscal calendar.
    pub fiscal: FiscalPeriodManager,
    /// Bank accounts and match proposals.
    pub bank: BankStatementMatcher,
    /// Reconciliation sessions.
    pub reconciliations: ReconciliationSessions,
    /// Year-end closing.
    pub year_end: YearEndCloser,
}

impl Ledger {
    /// Builds every component over `db`.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            accounts: AccountRegistry::new(db.clone()),
            poster: LedgerPoster::new(db.clone()),
            reports: TrialBalanceCalculator::new(db.clone()),
            fiscal: FiscalPeriodManager::new(db.clone()),
            bank: BankStatementMatcher::new(db.clone()),
            reconciliations: ReconciliationSessions::new(db.clone()),
            year_end: YearEndCloser::new(db.clone()),
        }
    }
}
