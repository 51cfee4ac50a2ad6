//! Clock seam.
//!
//! The ledger never reads the system time directly; "today" gates period closing
//! and timestamps reconciliations, so tests pin it with [`FixedClock`].

use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Source of the current date and time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a date (midnight UTC) that tests can move.
#[derive(Debug)]
pub struct FixedClock {
    today: RwLock<NaiveDate>,
}

impl FixedClock {
    /// Creates a clock reporting `today`.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: RwLock::new(today),
        }
    }

    /// Moves the clock to `today`.
    pub fn set(&self, today: NaiveDate) {
        if let Ok(mut guard) = self.today.write() {
            *guard = today;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let today = self.today.read().map_or(NaiveDate::MIN, |guard| *guard);
        today.and_time(NaiveTime::default()).and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_moves() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.today(), start);

        let later = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        clock.set(later);
        assert_eq!(clock.today(), later);
    }
}
