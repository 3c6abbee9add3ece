//! System clock adapter
//!
//! Production implementation of the `Clock` port.

use chrono::{DateTime, Utc};
use payql_application::ports::Clock;

/// Wall clock in UTC, used for token expiry arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a new system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
