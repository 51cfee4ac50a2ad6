//! TrialBalanceCalculator: report queries over committed ledger state.

use chrono::NaiveDate;
use tracing::debug;

use tally_core::LedgerResult;
use tally_core::reports::{IncomeSummary, ReportService, TrialBalanceReport, TrialBalanceTotals};
use tally_shared::types::TenantId;

use crate::queries;
use crate::store::Database;

/// Read-only report queries.
#[derive(Debug, Clone)]
pub struct TrialBalanceCalculator {
    db: Database,
}

impl TrialBalanceCalculator {
    /// Creates a new calculator.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Trial balance of postable accounts as of a date.
    ///
    /// Reads a single repeatable-read snapshot, so concurrent posting never
    /// shows up half-applied.
    pub async fn trial_balance(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
        include_zero: bool,
    ) -> LedgerResult<TrialBalanceReport> {
        let snapshot = self.db.snapshot().await?;
        let rows = queries::trial_balance_rows(&snapshot, tenant_id, None, as_of).await?;
        let report = ReportService::generate_trial_balance(tenant_id, as_of, rows, include_zero);
        debug!(
            tenant_id = %tenant_id,
            as_of = %as_of,
            rows = report.rows.len(),
            balanced = report.totals.is_balanced,
            "Trial balance generated"
        );
        Ok(report)
    }

    /// Debit and credit totals over every line in the database, across tenants.
    pub async fn ledger_totals(&self) -> LedgerResult<TrialBalanceTotals> {
        queries::ledger_totals(self.db.connection()).await
    }

    /// Revenue, expenses and net income through a date.
    pub async fn income_summary(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
    ) -> LedgerResult<IncomeSummary> {
        let snapshot = self.db.snapshot().await?;
        let rows = queries::trial_balance_rows(&snapshot, tenant_id, None, as_of).await?;
        Ok(ReportService::income_summary(as_of, &rows))
    }
}
