//! `SeaORM` entity definitions for the ledger schema.

pub mod account_types;
pub mod accounts;
pub mod bank_accounts;
pub mod bank_transactions;
pub mod fiscal_periods;
pub mod fiscal_years;
pub mod journal_entries;
pub mod ledger_lines;
pub mod reconciliation_matches;
pub mod reconciliations;
pub mod sea_orm_active_enums;
pub mod tenant_settings;
