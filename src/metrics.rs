use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Per-stage counters.
///
/// Clones share the same underlying counters, so the pipeline can keep one
/// handle per stage while the stage thread updates another.
#[derive(Debug, Clone)]
pub struct StageMetrics {
    /// Number of values forwarded downstream
    forwarded: Arc<AtomicU64>,
    /// Number of values not forwarded (rejected by a filter predicate, or
    /// discarded on ring overflow)
    dropped: Arc<AtomicU64>,
    /// Number of drains performed by a batch stage
    flushes: Arc<AtomicU64>,
}

impl StageMetrics {
    /// Create a new metrics collector for a stage
    pub fn new() -> Self {
        Self {
            forwarded: Arc::new(AtomicU64::new(0)),
            dropped: Arc::new(AtomicU64::new(0)),
            flushes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record a value forwarded downstream
    pub fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a value that was rejected or discarded
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one drain of the ring
    pub fn record_flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the total number of values forwarded
    pub fn total_forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    /// Get the total number of values rejected or discarded
    pub fn total_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Get the total number of flushes
    pub fn total_flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Get a snapshot of current counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_forwarded: self.total_forwarded(),
            total_dropped: self.total_dropped(),
            total_flushes: self.total_flushes(),
        }
    }
}

impl Default for StageMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of one stage's counters at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total_forwarded: u64,
    pub total_dropped: u64,
    pub total_flushes: u64,
}

impl MetricsSnapshot {
    /// Format counters as a human-readable string
    pub fn format(&self) -> String {
        format!(
            "Forwarded: {}, Dropped: {}, Flushes: {}",
            self.total_forwarded, self.total_dropped, self.total_flushes
        )
    }
}
