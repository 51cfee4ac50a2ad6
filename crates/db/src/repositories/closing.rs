//! YearEndCloser: zeroes temporary accounts into retained earnings and closes the year.

use sea_orm::{ActiveModelTrait, Set};
use tracing::info;

use tally_core::closing::{YearEndResult, build_closing_plan};
use tally_core::events::LedgerEvent;
use tally_core::fiscal::{FiscalStatus, PostingPolicy, check_year_close};
use tally_core::ledger::{EntrySource, JournalEntryInput};
use tally_core::{LedgerError, LedgerResult};
use tally_shared::types::{FiscalYearId, TenantId};

use super::ledger::{log_posted, post_in};
use crate::entities::fiscal_years;
use crate::mapping::StorageResultExt;
use crate::queries;
use crate::store::Database;

/// Fiscal year closing.
#[derive(Debug, Clone)]
pub struct YearEndCloser {
    db: Database,
}

impl YearEndCloser {
    /// Creates a new closer.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Closes a fiscal year whose periods are all closed.
    ///
    /// Posts one closing entry dated the year end that moves the year's revenue
    /// and expense activity into the designated retained-earnings account, then
    /// marks the year closed. Both happen in one unit of work.
    ///
    /// Only lines dated within the year are closed, so years may be closed in
    /// any order without carrying another year's activity.
    pub async fn close_year(
        &self,
        tenant_id: TenantId,
        fiscal_year_id: FiscalYearId,
    ) -> LedgerResult<YearEndResult> {
        let mut tx = self.db.begin(tenant_id).await?;
        let year = queries::fiscal_year(tx.connection(), tenant_id, fiscal_year_id).await?;
        let periods = queries::periods_of_year(tx.connection(), fiscal_year_id).await?;
        check_year_close(&year, &periods)?;

        let retained_earnings = queries::retained_earnings(tx.connection(), tenant_id)
            .await?
            .ok_or_else(|| {
                LedgerError::validation("no retained earnings account has been designated")
            })?;

        let rows = queries::trial_balance_rows(
            tx.connection(),
            tenant_id,
            Some(year.start_date),
            year.end_date,
        )
        .await?;
        let plan = build_closing_plan(&rows, retained_earnings);

        let closing = if plan.lines.is_empty() {
            None
        } else {
            let input = JournalEntryInput::new(year.end_date, plan.lines)
                .with_description(format!("Year-end close {}", year.name));
            Some(post_in(
                &mut tx,
                tenant_id,
                input,
                EntrySource::YearEndClose { fiscal_year_id },
                PostingPolicy::YearEndClose(fiscal_year_id),
            )
            .await?)
        };

        fiscal_years::ActiveModel {
            id: Set(fiscal_year_id.into_inner()),
            status: Set(FiscalStatus::Closed.into()),
            closed_at: Set(Some(tx.now())),
            ..Default::default()
        }
        .update(tx.connection())
        .await
        .storage()?;

        tx.publish(LedgerEvent::FiscalYearClosed {
            tenant_id,
            fiscal_year_id,
            net_income: plan.net_income,
        });
        tx.commit().await?;

        if let Some(entry) = &closing {
            log_posted(entry);
        }
        info!(
            tenant_id = %tenant_id,
            fiscal_year_id = %fiscal_year_id,
            name = %year.name,
            net_income = %plan.net_income,
            "Fiscal year closed"
        );
        Ok(YearEndResult {
            fiscal_year_id,
            net_income: plan.net_income,
            closing_entry: closing.map(|c| c.entry.id),
        })
    }
}
