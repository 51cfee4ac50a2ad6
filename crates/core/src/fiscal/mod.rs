//! Fiscal year and period management.

pub mod calendar;
pub mod period;
pub mod rules;

#[cfg(test)]
mod rules_props;

pub use calendar::{date_ranges_overlap, generate_monthly_periods, validate_date_range};
pub use period::{FiscalPeriod, FiscalStatus, FiscalYear, FiscalYearWithPeriods};
pub use rules::{
    CloseOptions, PostingPolicy, check_close, check_posting, check_reopen, check_year_close,
};
