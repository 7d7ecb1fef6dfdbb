//! Status feed - Push notifications for staff-written status changes.
//!
//! Staff writes are published on a `tokio::sync::broadcast` channel. Each
//! message carries the order's full current status, never a delta, so a
//! subscriber that misses or reorders messages still converges: the
//! [`StatusBoard`] keeps the furthest stage seen per order.

use crate::core::{order::OrderCode, status::OrderStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Channel capacity for broadcast.
const CHANNEL_CAPACITY: usize = 256;

/// One status write, as observed by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Order the write applied to
    pub code: OrderCode,
    /// Status after the write
    pub status: OrderStatus,
    /// When the write was accepted
    pub at: DateTime<Utc>,
}

/// Publisher side of the status feed. Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct StatusFeed {
    sender: broadcast::Sender<StatusChange>,
}

impl Default for StatusFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusFeed {
    /// Creates a feed with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publishes a change. Having no subscribers is not an error.
    pub fn publish(&self, change: StatusChange) {
        match self.sender.send(change) {
            Ok(receivers) => debug!("Status change delivered to {} subscribers", receivers),
            Err(_) => debug!("Status change published with no subscribers"),
        }
    }

    /// Opens a subscription that sees every change published from now on.
    #[must_use]
    pub fn subscribe(&self) -> StatusSubscription {
        StatusSubscription {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Receiving side of the status feed.
#[derive(Debug)]
pub struct StatusSubscription {
    receiver: broadcast::Receiver<StatusChange>,
}

impl StatusSubscription {
    /// Waits for the next change. Returns `None` once every publisher is gone.
    ///
    /// Messages dropped because this subscriber fell behind are skipped; the
    /// next message still carries a full status.
    pub async fn recv(&mut self) -> Option<StatusChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Status subscriber lagged, skipped {} changes", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns a change if one is already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<StatusChange> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) => return Some(change),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Status subscriber lagged, skipped {} changes", skipped);
                }
                Err(_) => return None,
            }
        }
    }
}

/// Latest known status per order, merged from possibly out-of-order changes.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    statuses: HashMap<OrderCode, OrderStatus>,
}

impl StatusBoard {
    /// Creates an empty board
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an observed status and returns the board's status for that order.
    pub fn observe(&mut self, code: &OrderCode, status: OrderStatus) -> OrderStatus {
        let entry = self.statuses.entry(code.clone()).or_insert(status);
        *entry = (*entry).max(status);
        *entry
    }

    /// Applies a feed message.
    pub fn apply(&mut self, change: &StatusChange) -> OrderStatus {
        self.observe(&change.code, change.status)
    }

    /// Current status of an order, if any change was seen for it
    #[must_use]
    pub fn status(&self, code: &OrderCode) -> Option<OrderStatus> {
        self.statuses.get(code).copied()
    }
}
