//! `SeaORM` active enums mapped to `PostgreSQL` enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use tally_core::account as core_account;
use tally_core::bank::ReconciliationStatus as CoreReconciliationStatus;
use tally_core::fiscal::FiscalStatus as CoreFiscalStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_category")]
pub enum AccountCategory {
    #[sea_orm(string_value = "asset")]
    Asset,
    #[sea_orm(string_value = "liability")]
    Liability,
    #[sea_orm(string_value = "equity")]
    Equity,
    #[sea_orm(string_value = "revenue")]
    Revenue,
    #[sea_orm(string_value = "expense")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "normal_balance")]
pub enum NormalBalance {
    #[sea_orm(string_value = "debit")]
    Debit,
    #[sea_orm(string_value = "credit")]
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "fiscal_status")]
pub enum FiscalStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_source")]
pub enum EntrySource {
    #[sea_orm(string_value = "manual")]
    Manual,
    #[sea_orm(string_value = "opening_balance")]
    OpeningBalance,
    #[sea_orm(string_value = "reversal")]
    Reversal,
    #[sea_orm(string_value = "year_end_close")]
    YearEndClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "reconciliation_status")]
pub enum ReconciliationStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<core_account::AccountCategory> for AccountCategory {
    fn from(value: core_account::AccountCategory) -> Self {
        match value {
            core_account::AccountCategory::Asset => Self::Asset,
            core_account::AccountCategory::Liability => Self::Liability,
            core_account::AccountCategory::Equity => Self::Equity,
            core_account::AccountCategory::Revenue => Self::Revenue,
            core_account::AccountCategory::Expense => Self::Expense,
        }
    }
}

impl From<AccountCategory> for core_account::AccountCategory {
    fn from(value: AccountCategory) -> Self {
        match value {
            AccountCategory::Asset => Self::Asset,
            AccountCategory::Liability => Self::Liability,
            AccountCategory::Equity => Self::Equity,
            AccountCategory::Revenue => Self::Revenue,
            AccountCategory::Expense => Self::Expense,
        }
    }
}

impl From<core_account::NormalBalance> for NormalBalance {
    fn from(value: core_account::NormalBalance) -> Self {
        match value {
            core_account::NormalBalance::Debit => Self::Debit,
            core_account::NormalBalance::Credit => Self::Credit,
        }
    }
}

impl From<NormalBalance> for core_account::NormalBalance {
    fn from(value: NormalBalance) -> Self {
        match value {
            NormalBalance::Debit => Self::Debit,
            NormalBalance::Credit => Self::Credit,
        }
    }
}

impl From<CoreFiscalStatus> for FiscalStatus {
    fn from(value: CoreFiscalStatus) -> Self {
        match value {
            CoreFiscalStatus::Open => Self::Open,
            CoreFiscalStatus::Closed => Self::Closed,
        }
    }
}

impl From<FiscalStatus> for CoreFiscalStatus {
    fn from(value: FiscalStatus) -> Self {
        match value {
            FiscalStatus::Open => Self::Open,
            FiscalStatus::Closed => Self::Closed,
        }
    }
}

impl From<CoreReconciliationStatus> for ReconciliationStatus {
    fn from(value: CoreReconciliationStatus) -> Self {
        match value {
            CoreReconciliationStatus::Draft => Self::Draft,
            CoreReconciliationStatus::InProgress => Self::InProgress,
            CoreReconciliationStatus::Completed => Self::Completed,
            CoreReconciliationStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<ReconciliationStatus> for CoreReconciliationStatus {
    fn from(value: ReconciliationStatus) -> Self {
        match value {
            ReconciliationStatus::Draft => Self::Draft,
            ReconciliationStatus::InProgress => Self::InProgress,
            ReconciliationStatus::Completed => Self::Completed,
            ReconciliationStatus::Cancelled => Self::Cancelled,
        }
    }
}
