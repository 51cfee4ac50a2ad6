//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_shared::types::{AccountId, TenantId};

use crate::account::{AccountCategory, NormalBalance};

/// One account's line in a trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account category.
    pub category: AccountCategory,
    /// Normal balance side.
    pub normal_balance: NormalBalance,
    /// Total debits dated on or before the report date.
    pub debit_total: Decimal,
    /// Total credits dated on or before the report date.
    pub credit_total: Decimal,
    /// Net balance signed per the normal balance.
    pub balance: Decimal,
}

impl TrialBalanceRow {
    /// Raw `debit - credit`.
    #[must_use]
    pub fn net_debit(&self) -> Decimal {
        self.debit_total - self.credit_total
    }
}

/// Trial balance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Tenant reported on.
    pub tenant_id: TenantId,
    /// As of date.
    pub as_of: NaiveDate,
    /// Rows ordered by account code.
    pub rows: Vec<TrialBalanceRow>,
    /// Totals.
    pub totals: TrialBalanceTotals,
}

/// Trial balance totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

impl TrialBalanceTotals {
    /// Totals from debit and credit sums.
    #[must_use]
    pub fn new(total_debit: Decimal, total_credit: Decimal) -> Self {
        Self {
            total_debit,
            total_credit,
            is_balanced: total_debit == total_credit,
        }
    }
}

/// Revenue, expense and net income up to a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeSummary {
    /// As of date.
    pub as_of: NaiveDate,
    /// Σ(credit - debit) over revenue accounts.
    pub revenue_total: Decimal,
    /// Σ(debit - credit) over expense accounts.
    pub expense_total: Decimal,
    /// Revenue minus expenses.
    pub net_income: Decimal,
}
