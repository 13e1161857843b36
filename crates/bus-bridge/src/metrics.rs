//! Counters for bridge operations
//!
//! ## Usage
//!
//! ```ignore
//! let metrics = Arc::new(BridgeMetrics::new());
//! let processor = BridgeProcessor::new(bus, mapping, &settings)?.with_metrics(metrics.clone());
//!
//! // ... later
//! let snapshot = metrics.snapshot();
//! println!("{} requests, {} reply failures", snapshot.requested, snapshot.reply_failures);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters shared by one or more processors
#[derive(Debug, Default)]
pub struct BridgeMetrics {
    /// Units published to all consumers
    pub published: AtomicU64,
    /// Units sent point-to-point without a reply
    pub sent: AtomicU64,
    /// Units sent as requests awaiting a reply
    pub requested: AtomicU64,
    /// Replies written into a unit's response slot
    pub replies_received: AtomicU64,
    /// Requests whose reply failed
    pub reply_failures: AtomicU64,
    /// Units failed before or while sending
    pub sync_failures: AtomicU64,
}

impl BridgeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_requested(&self) {
        self.requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reply(&self) {
        self.replies_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reply_failure(&self) {
        self.reply_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sync_failure(&self) {
        self.sync_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Requests still waiting for a reply
    pub fn in_flight(&self) -> u64 {
        let requested = self.requested.load(Ordering::Relaxed);
        let settled = self.replies_received.load(Ordering::Relaxed)
            + self.reply_failures.load(Ordering::Relaxed);
        requested.saturating_sub(settled)
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            requested: self.requested.load(Ordering::Relaxed),
            replies_received: self.replies_received.load(Ordering::Relaxed),
            reply_failures: self.reply_failures.load(Ordering::Relaxed),
            sync_failures: self.sync_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`BridgeMetrics`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub published: u64,
    pub sent: u64,
    pub requested: u64,
    pub replies_received: u64,
    pub reply_failures: u64,
    pub sync_failures: u64,
}

impl MetricsSnapshot {
    /// Units that reached the bus in any mode
    pub fn dispatched(&self) -> u64 {
        self.published + self.sent + self.requested
    }
}
