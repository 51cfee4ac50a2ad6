//! FiscalPeriodManager: fiscal years, periods and their close/reopen lifecycle.

use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, Set};
use tracing::info;

use tally_core::events::LedgerEvent;
use tally_core::fiscal::{
    CloseOptions, FiscalPeriod, FiscalStatus, FiscalYear, FiscalYearWithPeriods, check_close,
    check_reopen, date_ranges_overlap, generate_monthly_periods, validate_date_range,
};
use tally_core::{LedgerError, LedgerResult};
use tally_shared::types::{FiscalPeriodId, FiscalYearId, TenantId};

use crate::entities::fiscal_periods;
use crate::mapping::{self, StorageResultExt};
use crate::queries;
use crate::store::{Database, Transaction};

/// Input for creating a fiscal year.
#[derive(Debug, Clone)]
pub struct CreateFiscalYearInput {
    /// Fiscal year name (e.g., "FY 2026").
    pub name: String,
    /// Start date of the fiscal year.
    pub start_date: NaiveDate,
    /// End date of the fiscal year.
    pub end_date: NaiveDate,
}

/// Fiscal calendar operations.
#[derive(Debug, Clone)]
pub struct FiscalPeriodManager {
    db: Database,
}

impl FiscalPeriodManager {
    /// Creates a new fiscal period manager.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a fiscal year with auto-generated monthly periods.
    ///
    /// # Errors
    ///
    /// Returns a validation error if:
    /// - the name is empty
    /// - start_date >= end_date
    /// - the range overlaps an existing fiscal year of the tenant
    pub async fn create_fiscal_year(
        &self,
        tenant_id: TenantId,
        input: CreateFiscalYearInput,
    ) -> LedgerResult<FiscalYearWithPeriods> {
        if input.name.trim().is_empty() {
            return Err(LedgerError::validation("fiscal year name cannot be empty"));
        }
        validate_date_range(input.start_date, input.end_date)?;

        let tx = self.db.begin(tenant_id).await?;
        let existing = queries::tenant_fiscal_years(tx.connection(), tenant_id).await?;
        if let Some(overlapping) = existing.iter().find(|y| {
            date_ranges_overlap(y.start_date, y.end_date, input.start_date, input.end_date)
        }) {
            return Err(LedgerError::validation(format!(
                "fiscal year overlaps with existing year {}",
                overlapping.name
            )));
        }

        let fiscal_year = FiscalYear {
            id: FiscalYearId::new(),
            tenant_id,
            name: input.name,
            start_date: input.start_date,
            end_date: input.end_date,
            status: FiscalStatus::Open,
            closed_at: None,
        };
        let periods =
            generate_monthly_periods(tenant_id, fiscal_year.id, input.start_date, input.end_date);

        mapping::fiscal_year_row(&fiscal_year)
            .insert(tx.connection())
            .await
            .storage()?;
        for period in &periods {
            mapping::fiscal_period_row(period)
                .insert(tx.connection())
                .await
                .storage()?;
        }
        tx.commit().await?;

        info!(
            tenant_id = %tenant_id,
            fiscal_year_id = %fiscal_year.id,
            name = %fiscal_year.name,
            periods = periods.len(),
            "Fiscal year created"
        );
        Ok(FiscalYearWithPeriods {
            fiscal_year,
            periods,
        })
    }

    /// Gets a fiscal year with its periods.
    pub async fn get_fiscal_year(
        &self,
        tenant_id: TenantId,
        id: FiscalYearId,
    ) -> LedgerResult<FiscalYearWithPeriods> {
        let snapshot = self.db.snapshot().await?;
        let fiscal_year = queries::fiscal_year(&snapshot, tenant_id, id).await?;
        let periods = queries::periods_of_year(&snapshot, id).await?;
        Ok(FiscalYearWithPeriods {
            fiscal_year,
            periods,
        })
    }

    /// Lists a tenant's fiscal years, most recent first.
    pub async fn list_fiscal_years(&self, tenant_id: TenantId) -> LedgerResult<Vec<FiscalYear>> {
        queries::tenant_fiscal_years(self.db.connection(), tenant_id).await
    }

    /// Finds the period containing a date.
    pub async fn find_period_for_date(
        &self,
        tenant_id: TenantId,
        date: NaiveDate,
    ) -> LedgerResult<Option<FiscalPeriod>> {
        queries::period_for_date(self.db.connection(), tenant_id, date).await
    }

    /// Gets a period.
    pub async fn get_period(
        &self,
        tenant_id: TenantId,
        id: FiscalPeriodId,
    ) -> LedgerResult<FiscalPeriod> {
        queries::period(self.db.connection(), tenant_id, id).await
    }

    /// Closes a period.
    ///
    /// Every earlier period of the year must already be closed. Unless `force`
    /// is set, the period must also have ended (when configured).
    pub async fn close_period(
        &self,
        tenant_id: TenantId,
        id: FiscalPeriodId,
        force: bool,
    ) -> LedgerResult<FiscalPeriod> {
        let mut tx = self.db.begin(tenant_id).await?;
        let mut period = queries::period(tx.connection(), tenant_id, id).await?;
        let year = queries::fiscal_year(tx.connection(), tenant_id, period.fiscal_year_id).await?;
        let siblings = queries::periods_of_year(tx.connection(), year.id).await?;
        let options = CloseOptions {
            today: tx.today(),
            require_period_end: tx.config().require_period_end_before_close,
            force,
        };
        check_close(&year, &siblings, &period, options)?;

        period.status = FiscalStatus::Closed;
        period.closed_at = Some(tx.now());
        set_status(&tx, &period).await?;

        tx.publish(LedgerEvent::PeriodClosed {
            tenant_id,
            period_id: id,
        });
        tx.commit().await?;

        info!(tenant_id = %tenant_id, period_id = %id, name = %period.name, force, "Fiscal period closed");
        Ok(period)
    }

    /// Reopens a closed period. No later period of the year may be closed.
    pub async fn reopen_period(
        &self,
        tenant_id: TenantId,
        id: FiscalPeriodId,
    ) -> LedgerResult<FiscalPeriod> {
        let mut tx = self.db.begin(tenant_id).await?;
        let mut period = queries::period(tx.connection(), tenant_id, id).await?;
        let year = queries::fiscal_year(tx.connection(), tenant_id, period.fiscal_year_id).await?;
        let siblings = queries::periods_of_year(tx.connection(), year.id).await?;
        check_reopen(&year, &siblings, &period)?;

        period.status = FiscalStatus::Open;
        period.closed_at = None;
        set_status(&tx, &period).await?;

        tx.publish(LedgerEvent::PeriodReopened {
            tenant_id,
            period_id: id,
        });
        tx.commit().await?;

        info!(tenant_id = %tenant_id, period_id = %id, name = %period.name, "Fiscal period reopened");
        Ok(period)
    }
}

async fn set_status(tx: &Transaction, period: &FiscalPeriod) -> LedgerResult<()> {
    fiscal_periods::ActiveModel {
        id: Set(period.id.into_inner()),
        status: Set(period.status.into()),
        closed_at: Set(period.closed_at),
        ..Default::default()
    }
    .update(tx.connection())
    .await
    .storage()?;
    Ok(())
}
