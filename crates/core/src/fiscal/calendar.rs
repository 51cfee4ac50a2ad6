//! Fiscal calendar generation.

use chrono::{Datelike, NaiveDate};

use tally_shared::types::{FiscalPeriodId, FiscalYearId, TenantId};

use super::period::{FiscalPeriod, FiscalStatus};
use crate::error::{LedgerError, LedgerResult};

/// Validates that a fiscal year's start is before its end.
pub fn validate_date_range(start_date: NaiveDate, end_date: NaiveDate) -> LedgerResult<()> {
    if start_date >= end_date {
        return Err(LedgerError::validation(format!(
            "start date {start_date} must be before end date {end_date}"
        )));
    }
    Ok(())
}

/// Two closed ranges overlap if `a_start <= b_end && a_end >= b_start`.
#[must_use]
pub fn date_ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Generates open monthly periods covering `[start_date, end_date]`.
///
/// The first period starts on `start_date` and each period ends at the end of
/// its calendar month; the last is truncated at `end_date`.
#[must_use]
pub fn generate_monthly_periods(
    tenant_id: TenantId,
    fiscal_year_id: FiscalYearId,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Vec<FiscalPeriod> {
    let mut periods = Vec::new();
    let mut current = Some(start_date);
    let mut period_number = 1;

    while let Some(start) = current.filter(|d| *d <= end_date) {
        let month_end = last_day_of_month(start).unwrap_or(end_date);
        let period_end = month_end.min(end_date);

        periods.push(FiscalPeriod {
            id: FiscalPeriodId::new(),
            tenant_id,
            fiscal_year_id,
            period_number,
            name: format!("{} {}", month_name(start.month()), start.year()),
            start_date: start,
            end_date: period_end,
            status: FiscalStatus::Open,
            closed_at: None,
        });

        current = period_end.succ_opt();
        period_number += 1;
    }

    periods
}

/// Last day of the month containing `date`.
fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}
