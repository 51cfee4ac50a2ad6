//! Ledger components over the database.
//!
//! Each component is a cheap handle over a shared [`Database`](crate::Database).
//! Every mutating operation runs in one database transaction and commits or
//! leaves the database untouched.

pub mod account;
pub mod bank;
pub mod closing;
pub mod fiscal;
pub mod ledger;
pub mod reconciliation;
pub mod report;

pub use account::{AccountRegistry, CreatedAccount};
pub use bank::BankStatementMatcher;
pub use closing::YearEndCloser;
pub use fiscal::{CreateFiscalYearInput, FiscalPeriodManager};
pub use ledger::LedgerPoster;
pub use reconciliation::ReconciliationSessions;
pub use report::TrialBalanceCalculator;
