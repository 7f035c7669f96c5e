//! Guard metrics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for outbound request checks.
#[derive(Debug, Default)]
pub struct GuardMetrics {
    /// Total number of checks.
    pub total_checks: AtomicU64,

    /// Number of allowed requests.
    pub allowed_requests: AtomicU64,

    /// Number of blocked requests.
    pub blocked_requests: AtomicU64,

    /// Checks answered from the verdict cache.
    pub cache_hits: AtomicU64,
}

impl GuardMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an allowed request.
    pub fn record_allowed(&self) {
        self.total_checks.fetch_add(1, Ordering::Relaxed);
        self.allowed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a blocked request.
    pub fn record_blocked(&self) {
        self.total_checks.fetch_add(1, Ordering::Relaxed);
        self.blocked_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request allowed from cache.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        self.record_allowed();
    }

    pub fn total(&self) -> u64 {
        self.total_checks.load(Ordering::Relaxed)
    }

    pub fn allowed(&self) -> u64 {
        self.allowed_requests.load(Ordering::Relaxed)
    }

    pub fn blocked(&self) -> u64 {
        self.blocked_requests.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Get a snapshot of the metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_checks: self.total(),
            allowed_requests: self.allowed(),
            blocked_requests: self.blocked(),
            cache_hits: self.cache_hits(),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total_checks: u64,
    pub allowed_requests: u64,
    pub blocked_requests: u64,
    pub cache_hits: u64,
}
