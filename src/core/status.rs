//! Order status resolution.
//!
//! An order moves through `received → preparing → ready → completed` and never
//! moves back. Where the current stage comes from is fixed per order by its
//! [`StatusSource`]: either derived from the time elapsed since checkout, or
//! whatever staff last wrote for it.

use crate::errors::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minutes an order stays `received` in the simulated flow
pub const RECEIVED_MINUTES: i64 = 2;
/// Minutes after checkout at which a simulated order becomes `ready`
pub const PREPARING_UNTIL_MINUTES: i64 = 5;
/// Minutes after checkout at which a simulated order becomes `completed`
pub const READY_UNTIL_MINUTES: i64 = 10;

/// Lifecycle stage of an order. Variants are declared in lifecycle order, so
/// the derived `Ord` is the forward direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// The kitchen has the order
    Received,
    /// The kitchen is cooking
    Preparing,
    /// Food is ready to be served or picked up
    Ready,
    /// Served; nothing left to do
    Completed,
}

impl OrderStatus {
    /// Every stage in lifecycle order
    pub const ALL: [Self; 4] = [
        Self::Received,
        Self::Preparing,
        Self::Ready,
        Self::Completed,
    ];

    /// Lower-case wire name, as stored in the database and JSON slots.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Completed => "completed",
        }
    }

    /// Customer-facing label for tracking views.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Received => "Order received",
            Self::Preparing => "Being prepared",
            Self::Ready => "Ready to serve",
            Self::Completed => "Completed",
        }
    }

    /// Zero-based position in the lifecycle; tracking views light up every step `<=` this.
    #[must_use]
    pub const fn progress(self) -> usize {
        self as usize
    }

    /// The stage that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Received => Some(Self::Preparing),
            Self::Preparing => Some(Self::Ready),
            Self::Ready => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Whether the order still needs attention from the kitchen.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation(format!("Unknown order status: {s}")))
    }
}

/// Which mechanism decides the status of an order. Chosen once, at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusMode {
    /// Derived from elapsed wall-clock time
    Simulated,
    /// Written by staff
    Authoritative,
}

impl StatusMode {
    /// Lower-case wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simulated => "simulated",
            Self::Authoritative => "authoritative",
        }
    }
}

impl fmt::Display for StatusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulated" => Ok(Self::Simulated),
            "authoritative" => Ok(Self::Authoritative),
            other => Err(Error::validation(format!("Unknown status mode: {other}"))),
        }
    }
}

/// The input the resolver needs for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    /// Status follows from the creation time
    Simulated(DateTime<Utc>),
    /// Status is the stored value
    Authoritative(OrderStatus),
}

impl StatusSource {
    /// Resolves the current status as of `now`.
    #[must_use]
    pub fn resolve(&self, now: DateTime<Utc>) -> OrderStatus {
        match *self {
            Self::Simulated(created_at) => simulated_status(now - created_at),
            Self::Authoritative(stored) => stored,
        }
    }

    /// The mode this source belongs to
    #[must_use]
    pub const fn mode(&self) -> StatusMode {
        match self {
            Self::Simulated(_) => StatusMode::Simulated,
            Self::Authoritative(_) => StatusMode::Authoritative,
        }
    }
}

/// Maps the time since checkout onto a lifecycle stage.
///
/// Negative durations (a clock that moved backwards) count as zero.
#[must_use]
pub fn simulated_status(elapsed: Duration) -> OrderStatus {
    if elapsed < Duration::minutes(RECEIVED_MINUTES) {
        OrderStatus::Received
    } else if elapsed < Duration::minutes(PREPARING_UNTIL_MINUTES) {
        OrderStatus::Preparing
    } else if elapsed < Duration::minutes(READY_UNTIL_MINUTES) {
        OrderStatus::Ready
    } else {
        OrderStatus::Completed
    }
}

/// Accepts a staff write only if it keeps or advances the stage.
pub fn check_transition(from: OrderStatus, to: OrderStatus) -> Result<()> {
    if to < from {
        return Err(Error::StatusRegression { from, to });
    }
    Ok(())
}
