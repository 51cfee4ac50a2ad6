//! Property-based tests for the period stack discipline.

use chrono::NaiveDate;
use proptest::prelude::*;
use tally_shared::types::{FiscalYearId, TenantId};

use super::calendar::generate_monthly_periods;
use super::period::{FiscalStatus, FiscalYear};
use super::rules::{CloseOptions, check_close, check_reopen};

fn options() -> CloseOptions {
    CloseOptions {
        today: NaiveDate::from_ymd_opt(2100, 1, 1).unwrap(),
        require_period_end: true,
        force: false,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Replaying random close/reopen attempts keeps the closed periods a prefix.
    #[test]
    fn prop_closed_periods_form_a_prefix(
        ops in prop::collection::vec((any::<bool>(), 0usize..12), 1..60),
    ) {
        let tenant = TenantId::new();
        let id = FiscalYearId::new();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let year = FiscalYear {
            id,
            tenant_id: tenant,
            name: "FY2024".into(),
            start_date: start,
            end_date: end,
            status: FiscalStatus::Open,
            closed_at: None,
        };
        let mut periods = generate_monthly_periods(tenant, id, start, end);

        for (close, index) in ops {
            let target = periods[index].clone();
            if close {
                if check_close(&year, &periods, &target, options()).is_ok() {
                    periods[index].status = FiscalStatus::Closed;
                }
            } else if check_reopen(&year, &periods, &target).is_ok() {
                periods[index].status = FiscalStatus::Open;
            }

            let closed = periods.iter().take_while(|p| !p.is_open()).count();
            prop_assert!(
                periods.iter().skip(closed).all(|p| p.is_open()),
                "closed periods must be a chronological prefix"
            );
        }
    }

    /// Generated periods tile the year without gaps or overlap.
    #[test]
    fn prop_periods_tile_the_year(start_offset in 0i64..365, length in 1i64..800) {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let start = base + chrono::Duration::days(start_offset);
        let end = start + chrono::Duration::days(length);
        let periods = generate_monthly_periods(TenantId::new(), FiscalYearId::new(), start, end);

        prop_assert_eq!(periods.first().map(|p| p.start_date), Some(start));
        prop_assert_eq!(periods.last().map(|p| p.end_date), Some(end));
        for pair in periods.windows(2) {
            prop_assert_eq!(pair[0].end_date.succ_opt(), Some(pair[1].start_date));
            prop_assert_eq!(pair[0].period_number + 1, pair[1].period_number);
        }
    }
}
