//! Period state machine rules.
//!
//! Periods of a year close and reopen like a stack: a period closes only when
//! every earlier period is closed and reopens only when no later period is closed.

use chrono::NaiveDate;

use tally_shared::types::FiscalYearId;

use super::period::{FiscalPeriod, FiscalYear};
use crate::error::{LedgerError, LedgerResult};

/// Which periods a posting may land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostingPolicy {
    /// Only open periods.
    #[default]
    Standard,
    /// Also the closed periods of the year being closed.
    YearEndClose(FiscalYearId),
}

/// Options for closing a period.
#[derive(Debug, Clone, Copy)]
pub struct CloseOptions {
    /// The clock's current date.
    pub today: NaiveDate,
    /// Whether a period must have ended before it can close.
    pub require_period_end: bool,
    /// Skips the period-end check. Never skips the ordering check.
    pub force: bool,
}

/// Checks that a posting dated `date` may land in `period`.
pub fn check_posting(
    period: Option<&FiscalPeriod>,
    date: NaiveDate,
    policy: PostingPolicy,
) -> LedgerResult<()> {
    let period = period.ok_or(LedgerError::NoFiscalPeriod(date))?;
    if period.is_open() {
        return Ok(());
    }
    match policy {
        PostingPolicy::YearEndClose(year_id) if year_id == period.fiscal_year_id => Ok(()),
        _ => Err(LedgerError::PeriodClosed(date)),
    }
}

/// Checks that `target` may be closed given the other periods of its year.
pub fn check_close(
    year: &FiscalYear,
    periods: &[FiscalPeriod],
    target: &FiscalPeriod,
    options: CloseOptions,
) -> LedgerResult<()> {
    if year.is_closed() {
        return Err(LedgerError::AlreadyClosed(format!("fiscal year {}", year.name)));
    }
    if !target.is_open() {
        return Err(LedgerError::AlreadyClosed(format!("period {}", target.name)));
    }

    let blocking = periods
        .iter()
        .filter(|p| p.start_date < target.start_date && p.is_open())
        .min_by_key(|p| p.start_date);
    if let Some(blocking) = blocking {
        return Err(LedgerError::SequentialCloseViolation {
            period_id: target.id,
            blocking_period_id: blocking.id,
        });
    }

    if options.require_period_end && !options.force && target.end_date >= options.today {
        return Err(LedgerError::PeriodNotEnded {
            period_id: target.id,
            end_date: target.end_date,
        });
    }
    Ok(())
}

/// Checks that `target` may be reopened given the other periods of its year.
///
/// The blocking period reported is the latest closed one, which is the next
/// that would have to be reopened.
pub fn check_reopen(
    year: &FiscalYear,
    periods: &[FiscalPeriod],
    target: &FiscalPeriod,
) -> LedgerResult<()> {
    if year.is_closed() {
        return Err(LedgerError::AlreadyClosed(format!("fiscal year {}", year.name)));
    }
    if target.is_open() {
        return Err(LedgerError::validation(format!(
            "period {} is not closed",
            target.name
        )));
    }

    let blocking = periods
        .iter()
        .filter(|p| p.start_date > target.start_date && !p.is_open())
        .max_by_key(|p| p.start_date);
    if let Some(blocking) = blocking {
        return Err(LedgerError::SequentialCloseViolation {
            period_id: target.id,
            blocking_period_id: blocking.id,
        });
    }
    Ok(())
}

/// Checks that a year may be closed: it is open and all its periods are closed.
pub fn check_year_close(year: &FiscalYear, periods: &[FiscalPeriod]) -> LedgerResult<()> {
    if year.is_closed() {
        return Err(LedgerError::AlreadyClosed(format!("fiscal year {}", year.name)));
    }
    if let Some(open) = periods
        .iter()
        .filter(|p| p.is_open())
        .min_by_key(|p| p.start_date)
    {
        return Err(LedgerError::validation(format!(
            "fiscal year {} has open period {}",
            year.name, open.name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::calendar::generate_monthly_periods;
    use crate::fiscal::period::FiscalStatus;
    use tally_shared::types::TenantId;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn year() -> (FiscalYear, Vec<FiscalPeriod>) {
        let tenant = TenantId::new();
        let id = FiscalYearId::new();
        let periods = generate_monthly_periods(tenant, id, d(2024, 1, 1), d(2024, 3, 31));
        let year = FiscalYear {
            id,
            tenant_id: tenant,
            name: "FY2024Q1".into(),
            start_date: d(2024, 1, 1),
            end_date: d(2024, 3, 31),
            status: FiscalStatus::Open,
            closed_at: None,
        };
        (year, periods)
    }

    fn options() -> CloseOptions {
        CloseOptions {
            today: d(2025, 1, 1),
            require_period_end: true,
            force: false,
        }
    }

    #[test]
    fn test_close_out_of_order() {
        let (year, periods) = year();
        assert_eq!(
            check_close(&year, &periods, &periods[1], options()),
            Err(LedgerError::SequentialCloseViolation {
                period_id: periods[1].id,
                blocking_period_id: periods[0].id,
            })
        );
    }

    #[test]
    fn test_close_in_order() {
        let (year, mut periods) = year();
        for i in 0..periods.len() {
            let target = periods[i].clone();
            assert!(check_close(&year, &periods, &target, options()).is_ok());
            periods[i].status = FiscalStatus::Closed;
        }
    }

    #[test]
    fn test_close_already_closed() {
        let (year, mut periods) = year();
        periods[0].status = FiscalStatus::Closed;
        assert!(matches!(
            check_close(&year, &periods, &periods[0], options()),
            Err(LedgerError::AlreadyClosed(_))
        ));
    }

    #[test]
    fn test_period_not_ended_unless_forced() {
        let (year, periods) = year();
        let early = CloseOptions {
            today: d(2024, 1, 20),
            ..options()
        };
        assert!(matches!(
            check_close(&year, &periods, &periods[0], early),
            Err(LedgerError::PeriodNotEnded { .. })
        ));
        let forced = CloseOptions { force: true, ..early };
        assert!(check_close(&year, &periods, &periods[0], forced).is_ok());
        let relaxed = CloseOptions {
            require_period_end: false,
            ..early
        };
        assert!(check_close(&year, &periods, &periods[0], relaxed).is_ok());
    }

    #[test]
    fn test_force_does_not_bypass_order() {
        let (year, periods) = year();
        let forced = CloseOptions {
            force: true,
            ..options()
        };
        assert!(matches!(
            check_close(&year, &periods, &periods[2], forced),
            Err(LedgerError::SequentialCloseViolation { .. })
        ));
    }

    #[test]
    fn test_reopen_like_a_stack() {
        let (year, mut periods) = year();
        periods[0].status = FiscalStatus::Closed;
        periods[1].status = FiscalStatus::Closed;
        assert_eq!(
            check_reopen(&year, &periods, &periods[0]),
            Err(LedgerError::SequentialCloseViolation {
                period_id: periods[0].id,
                blocking_period_id: periods[1].id,
            })
        );
        assert!(check_reopen(&year, &periods, &periods[1]).is_ok());
        assert!(matches!(
            check_reopen(&year, &periods, &periods[2]),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_closed_year_blocks_everything() {
        let (mut year, mut periods) = year();
        for p in &mut periods {
            p.status = FiscalStatus::Closed;
        }
        year.status = FiscalStatus::Closed;
        assert!(matches!(
            check_reopen(&year, &periods, &periods[2]),
            Err(LedgerError::AlreadyClosed(_))
        ));
        assert!(matches!(
            check_year_close(&year, &periods),
            Err(LedgerError::AlreadyClosed(_))
        ));
    }

    #[test]
    fn test_year_close_requires_closed_periods() {
        let (year, mut periods) = year();
        periods[0].status = FiscalStatus::Closed;
        assert!(matches!(
            check_year_close(&year, &periods),
            Err(LedgerError::Validation(_))
        ));
        for p in &mut periods {
            p.status = FiscalStatus::Closed;
        }
        assert!(check_year_close(&year, &periods).is_ok());
    }

    #[test]
    fn test_posting_gate() {
        let (year, mut periods) = year();
        let date = d(2024, 1, 15);
        assert!(check_posting(Some(&periods[0]), date, PostingPolicy::Standard).is_ok());
        assert_eq!(
            check_posting(None, date, PostingPolicy::Standard),
            Err(LedgerError::NoFiscalPeriod(date))
        );
        periods[0].status = FiscalStatus::Closed;
        assert_eq!(
            check_posting(Some(&periods[0]), date, PostingPolicy::Standard),
            Err(LedgerError::PeriodClosed(date))
        );
        assert!(
            check_posting(Some(&periods[0]), date, PostingPolicy::YearEndClose(year.id)).is_ok()
        );
        assert_eq!(
            check_posting(
                Some(&periods[0]),
                date,
                PostingPolicy::YearEndClose(FiscalYearId::new())
            ),
            Err(LedgerError::PeriodClosed(date))
        );
    }
}
