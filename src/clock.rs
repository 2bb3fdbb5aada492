//! Wall-clock time source.
//!
//! The result envelope carries the time of the invocation. The time is read through the [Clock]
//! trait so that callers decide where it comes from and tests can pin it.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::AnalyticsError;

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// Return the current time.
    fn now(&self) -> OffsetDateTime;

    /// Return the current time formatted as an RFC 3339 timestamp.
    fn timestamp(&self) -> Result<String, AnalyticsError> {
        Ok(self.now().format(&Rfc3339)?)
    }
}

/// The system clock, in UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock that is stopped at a fixed time.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
