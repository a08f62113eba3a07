//! Injected clock
//!
//! The engine never reads the wall clock directly; "today" is injected
//! so the state machine stays deterministic under test.

use std::sync::Mutex;

use chrono::NaiveDate;

/// Source of the current date
pub trait Clock: Send + Sync {
    /// The current date
    fn today(&self) -> NaiveDate;
}

/// Wall-clock date in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Utc::now().date_naive()
    }
}

/// Settable clock for tests
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    /// Create a clock pinned to the given date
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    /// Move the clock to a new date
    pub fn set(&self, today: NaiveDate) {
        *self.today.lock().unwrap() = today;
    }

    /// Advance the clock by whole days
    pub fn advance_days(&self, days: i64) {
        let mut guard = self.today.lock().unwrap();
        *guard += chrono::Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap()
    }
}
