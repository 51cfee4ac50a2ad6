//! FiscalPeriodManager integration tests.

mod common;

use rust_decimal_macros::dec;

use common::{Fixture, date, transfer};
use tally_core::LedgerError;
use tally_core::fiscal::FiscalStatus;
use tally_db::CreateFiscalYearInput;
use tally_shared::LedgerConfig;

#[tokio::test]
async fn test_fiscal_year_generates_monthly_periods() {
    let fx = Fixture::new().await;
    let periods = &fx.year.periods;
    assert_eq!(periods.len(), 12);
    assert_eq!(periods[0].name, "January 2024");
    assert_eq!(periods[1].end_date, date(2024, 2, 29));
    assert_eq!(periods[11].end_date, date(2024, 12, 31));
    assert!(periods.iter().all(|p| p.status == FiscalStatus::Open));
    assert!(
        periods
            .windows(2)
            .all(|w| w[0].end_date.succ_opt() == Some(w[1].start_date))
    );
}

#[tokio::test]
async fn test_overlapping_year_rejected() {
    let fx = Fixture::new().await;
    let err = fx
        .ledger
        .fiscal
        .create_fiscal_year(
            fx.tenant,
            CreateFiscalYearInput {
                name: "FY2024b".to_string(),
                start_date: date(2024, 7, 1),
                end_date: date(2025, 6, 30),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[tokio::test]
async fn test_inverted_range_rejected() {
    let fx = Fixture::new().await;
    let err = fx
        .ledger
        .fiscal
        .create_fiscal_year(
            fx.tenant,
            CreateFiscalYearInput {
                name: "Backwards".to_string(),
                start_date: date(2026, 12, 31),
                end_date: date(2026, 1, 1),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[tokio::test]
async fn test_short_year_truncates_last_period() {
    let fx = Fixture::new().await;
    let year = fx
        .ledger
        .fiscal
        .create_fiscal_year(
            fx.tenant,
            CreateFiscalYearInput {
                name: "Stub 2025".to_string(),
                start_date: date(2025, 1, 1),
                end_date: date(2025, 3, 15),
            },
        )
        .await
        .unwrap();
    assert_eq!(year.periods.len(), 3);
    assert_eq!(year.periods[2].end_date, date(2025, 3, 15));

    let listed = fx.ledger.fiscal.list_fiscal_years(fx.tenant).await.unwrap();
    assert_eq!(listed[0].name, "Stub 2025");
    assert_eq!(listed[1].name, "FY2024");
}

#[tokio::test]
async fn test_periods_close_in_order() {
    let fx = Fixture::new().await;
    let err = fx
        .ledger
        .fiscal
        .close_period(fx.tenant, fx.period(2), false)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::SequentialCloseViolation {
            period_id: fx.period(2),
            blocking_period_id: fx.period(1),
        }
    );

    for n in 1..=3 {
        let closed = fx
            .ledger
            .fiscal
            .close_period(fx.tenant, fx.period(n), false)
            .await
            .unwrap();
        assert_eq!(closed.status, FiscalStatus::Closed);
    }
    assert_eq!(fx.events.count("period_closed"), 3);
}

#[tokio::test]
async fn test_force_never_bypasses_order() {
    let fx = Fixture::new().await;
    let err = fx
        .ledger
        .fiscal
        .close_period(fx.tenant, fx.period(2), true)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::SequentialCloseViolation { .. }));
}

#[tokio::test]
async fn test_period_not_ended_requires_force() {
    let fx = Fixture::new().await;
    fx.clock.set(date(2024, 1, 20));

    let err = fx
        .ledger
        .fiscal
        .close_period(fx.tenant, fx.period(1), false)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::PeriodNotEnded {
            period_id: fx.period(1),
            end_date: date(2024, 1, 31),
        }
    );

    fx.ledger
        .fiscal
        .close_period(fx.tenant, fx.period(1), true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_period_end_check_can_be_disabled() {
    let fx = Fixture::with_config(LedgerConfig {
        require_period_end_before_close: false,
        ..LedgerConfig::default()
    })
    .await;
    fx.clock.set(date(2024, 1, 2));
    fx.ledger
        .fiscal
        .close_period(fx.tenant, fx.period(1), false)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_closed_period_gates_posting_until_reopened() {
    let fx = Fixture::new().await;
    fx.close_through(2).await;

    let entry = transfer(date(2024, 2, 14), fx.rent, fx.cash, dec!(75.00));
    let err = fx.ledger.poster.post(fx.tenant, entry.clone()).await.unwrap_err();
    assert_eq!(err, LedgerError::PeriodClosed(date(2024, 2, 14)));

    fx.ledger
        .fiscal
        .reopen_period(fx.tenant, fx.period(2))
        .await
        .unwrap();
    fx.ledger.poster.post(fx.tenant, entry).await.unwrap();
    assert_eq!(fx.events.count("period_reopened"), 1);
}

#[tokio::test]
async fn test_reopen_blocked_by_later_closed_period() {
    let fx = Fixture::new().await;
    fx.close_through(3).await;

    let err = fx
        .ledger
        .fiscal
        .reopen_period(fx.tenant, fx.period(1))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::SequentialCloseViolation {
            period_id: fx.period(1),
            blocking_period_id: fx.period(3),
        }
    );

    for n in (1..=3).rev() {
        fx.ledger
            .fiscal
            .reopen_period(fx.tenant, fx.period(n))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_close_twice_and_reopen_open_period() {
    let fx = Fixture::new().await;
    fx.close_through(1).await;
    assert!(matches!(
        fx.ledger.fiscal.close_period(fx.tenant, fx.period(1), false).await,
        Err(LedgerError::AlreadyClosed(_))
    ));
    assert!(matches!(
        fx.ledger.fiscal.reopen_period(fx.tenant, fx.period(2)).await,
        Err(LedgerError::Validation(_))
    ));
}

#[tokio::test]
async fn test_find_period_for_date() {
    let fx = Fixture::new().await;
    let period = fx
        .ledger
        .fiscal
        .find_period_for_date(fx.tenant, date(2024, 7, 4))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(period.name, "July 2024");
    assert!(
        fx.ledger
            .fiscal
            .find_period_for_date(fx.tenant, date(2023, 7, 4))
            .await
            .unwrap()
            .is_none()
    );

    let year = fx
        .ledger
        .fiscal
        .get_fiscal_year(fx.tenant, fx.year.fiscal_year.id)
        .await
        .unwrap();
    assert_eq!(year.periods, fx.year.periods);
}
