//! Frozen time for handler and route tests.

use chrono::{DateTime, Duration, Utc};
use verdant_core::clock::Clock;

/// Reports the same instant on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// The same wall time `days` calendar days later, for streak scenarios.
    #[must_use]
    pub fn days_later(self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
