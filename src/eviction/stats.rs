//! Counters for the eviction sweep.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals shared by the scheduler, its cycles and their janitors.
#[derive(Debug, Default)]
pub struct EvictionStats {
    /// Cycles that ran to completion
    pub cycles: AtomicU64,
    /// Janitor invocations (one per DMap per cycle)
    pub dmaps_scanned: AtomicU64,
    /// Keys removed by the sweep
    pub keys_evicted: AtomicU64,
    /// Delete calls that failed and left the entry in place
    pub delete_failures: AtomicU64,
    /// Janitor invocations cut short by shutdown
    pub cancelled_scans: AtomicU64,
}

impl EvictionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycle_completed(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dmap_scanned(&self) {
        self.dmaps_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn evicted(&self, count: usize) {
        self.keys_evicted.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn delete_failed(&self) {
        self.delete_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn scan_cancelled(&self) {
        self.cancelled_scans.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of the counters.
    pub fn snapshot(&self) -> EvictionStatsSnapshot {
        EvictionStatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            dmaps_scanned: self.dmaps_scanned.load(Ordering::Relaxed),
            keys_evicted: self.keys_evicted.load(Ordering::Relaxed),
            delete_failures: self.delete_failures.load(Ordering::Relaxed),
            cancelled_scans: self.cancelled_scans.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`EvictionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionStatsSnapshot {
    pub cycles: u64,
    pub dmaps_scanned: u64,
    pub keys_evicted: u64,
    pub delete_failures: u64,
    pub cancelled_scans: u64,
}
