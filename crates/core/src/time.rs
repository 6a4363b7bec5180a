//! Clock abstraction so timestamps are deterministic in tests.

use crate::Time;
use chrono::{Duration, Utc};

/// Source of "now" for progress timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    /// Wall-clock time.
    #[default]
    System,
    /// Frozen at the given instant.
    Fixed(Time),
}

impl Clock {
    /// A clock frozen at `at`.
    pub fn fixed(at: Time) -> Self {
        Self::Fixed(at)
    }

    /// Current time according to this clock.
    pub fn now(&self) -> Time {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Move a fixed clock forward. No effect on the system clock.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// 2023-11-14T22:13:20Z, used by tests across the workspace.
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Deterministic timestamp for tests.
///
/// # Panics
///
/// Never in practice; the constant is a valid timestamp.
pub fn fixed_now() -> Time {
    chrono::DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let mut clock = Clock::fixed(fixed_now());
        clock.advance(Duration::days(2));
        assert_eq!(clock.now(), fixed_now() + Duration::days(2));
    }
}
