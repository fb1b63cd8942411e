// ⏰ Clock - explicit reference time
//
// Churn and high-frequency checks are relative to "now". The engine never
// reads the wall clock itself; a Clock is injected so reports stay
// reproducible.

use chrono::{NaiveDateTime, Utc};

pub trait Clock {
    /// Current reference time (UTC, naive like transaction dates)
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// Clock pinned to a fixed instant (tests, "as of" reports)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
