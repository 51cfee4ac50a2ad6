//! Report generation service.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use tally_shared::types::TenantId;

use super::types::{IncomeSummary, TrialBalanceReport, TrialBalanceRow, TrialBalanceTotals};
use crate::account::AccountCategory;

/// Service for generating reports from aggregated account activity.
pub struct ReportService;

impl ReportService {
    /// Generates a trial balance from per-account rows.
    ///
    /// Rows are sorted by code. With `include_zero == false`, rows whose net
    /// balance is zero are dropped; totals cover the rows returned.
    #[must_use]
    pub fn generate_trial_balance(
        tenant_id: TenantId,
        as_of: NaiveDate,
        mut rows: Vec<TrialBalanceRow>,
        include_zero: bool,
    ) -> TrialBalanceReport {
        if !include_zero {
            rows.retain(|r| !r.balance.is_zero());
        }
        rows.sort_by(|a, b| a.code.cmp(&b.code));

        let total_debit: Decimal = rows.iter().map(|r| r.debit_total).sum();
        let total_credit: Decimal = rows.iter().map(|r| r.credit_total).sum();

        TrialBalanceReport {
            tenant_id,
            as_of,
            rows,
            totals: TrialBalanceTotals::new(total_debit, total_credit),
        }
    }

    /// Revenue, expenses and net income from trial balance rows.
    #[must_use]
    pub fn income_summary(as_of: NaiveDate, rows: &[TrialBalanceRow]) -> IncomeSummary {
        let mut revenue_total = Decimal::ZERO;
        let mut expense_total = Decimal::ZERO;
        for row in rows {
            match row.category {
                AccountCategory::Revenue => revenue_total += row.credit_total - row.debit_total,
                AccountCategory::Expense => expense_total += row.debit_total - row.credit_total,
                _ => {}
            }
        }
        IncomeSummary {
            as_of,
            revenue_total,
            expense_total,
            net_income: revenue_total - expense_total,
        }
    }
}
