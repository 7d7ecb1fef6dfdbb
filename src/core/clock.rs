//! Time source for status resolution and checkout timestamps.

use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Supplies the current time. Swapped for a fixed clock in tests so status
/// resolution is deterministic.
pub trait Clock: Debug + Send + Sync {
    /// The current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
