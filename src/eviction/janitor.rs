//! Shard janitor: adaptive sampling over one DMap
//!
//! The janitor takes the DMap's lock once and keeps it until it returns.
//! While holding it, it repeats:
//!
//! ```text
//!        ┌──────────────────────────────┐
//!        │ shutdown signalled?  ──yes──►│ Cancelled
//!        │ deleted > max_total? ──yes──►│ Ceiling
//!        ├──────────────────────────────┤
//!        │ inspect ≤ batch_size entries │
//!        │ from a random slot, delete   │
//!        │ the expired ones             │
//!        ├──────────────────────────────┤
//!        │ deleted/batch_size < ratio? ─┼─yes─► LowYield
//!        └──────────────┬───────────────┘
//!                       └── loop
//! ```
//!
//! Deleted entries are gone, so each batch samples a fresh slice of what is
//! left. DMaps full of expired keys get swept harder within one cycle, clean
//! ones are abandoned after a single batch, and `max_total` caps how long the
//! lock is held no matter how the TTLs are distributed.

use super::config::EvictionConfig;
use super::deleter::{ExpiredKey, ExpiredKeyDeleter};
use super::stats::EvictionStats;
use crate::storage::{DMap, Storage};
use crate::time::Clock;
use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, error};

/// Why a janitor invocation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last batch deleted less than `continue_ratio` of `batch_size`.
    LowYield,
    /// More than `max_total` keys were deleted in this invocation.
    Ceiling,
    /// Shutdown was signalled before the next batch.
    Cancelled,
}

/// Outcome of one janitor invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub deleted: usize,
    pub inspected: usize,
    pub batches: usize,
    pub failures: usize,
    pub stop: StopReason,
}

/// Everything a janitor needs besides the DMap itself.
pub struct Janitor<'a> {
    pub part_id: usize,
    pub config: &'a EvictionConfig,
    pub deleter: &'a dyn ExpiredKeyDeleter,
    pub clock: &'a dyn Clock,
    pub shutdown: &'a watch::Receiver<bool>,
    pub stats: &'a EvictionStats,
}

impl Janitor<'_> {
    /// Sweeps expired keys out of `dmap`, holding its lock for the whole call.
    pub fn scan<R: Rng>(&self, dmap: &DMap, rng: &mut R) -> ScanReport {
        let mut report = ScanReport {
            deleted: 0,
            inspected: 0,
            batches: 0,
            failures: 0,
            stop: StopReason::LowYield,
        };

        let mut storage = dmap.lock();
        report.stop = loop {
            if *self.shutdown.borrow() {
                break StopReason::Cancelled;
            }
            if report.deleted > self.config.max_total {
                break StopReason::Ceiling;
            }

            let deleted = self.sweep_batch(dmap.name(), &mut storage, rng, &mut report);
            report.batches += 1;
            report.deleted += deleted;

            if !self.config.batch_is_hot(deleted) {
                break StopReason::LowYield;
            }
        };
        drop(storage);

        self.stats.dmap_scanned();
        self.stats.evicted(report.deleted);
        if report.stop == StopReason::Cancelled {
            self.stats.scan_cancelled();
        }
        if report.deleted > 0 {
            debug!(
                part_id = self.part_id,
                dmap = dmap.name(),
                deleted = report.deleted,
                batches = report.batches,
                "Evicted expired keys"
            );
        }

        report
    }

    /// Runs one batch and returns how many keys it deleted.
    fn sweep_batch<R: Rng>(
        &self,
        name: &str,
        storage: &mut Storage,
        rng: &mut R,
        report: &mut ScanReport,
    ) -> usize {
        if storage.is_empty() {
            return 0;
        }

        let now = self.clock.now_ms();
        let limit = self.config.batch_size;
        let start = rng.random_range(0..storage.len());

        let mut inspected = 0;
        let mut expired = Vec::new();
        storage.for_each_from(start, |hkey, vdata| {
            inspected += 1;
            if vdata.is_expired(now) {
                expired.push((hkey, vdata.key.clone()));
            }
            inspected < limit
        });
        report.inspected += inspected;

        let mut deleted = 0;
        for (hkey, key) in &expired {
            let target = ExpiredKey {
                part_id: self.part_id,
                dmap: name,
                hkey: *hkey,
                key: key.as_str(),
            };
            match self.deleter.delete(&target, storage) {
                Ok(()) => deleted += 1,
                Err(err) => {
                    // left in place, a later cycle retries it
                    report.failures += 1;
                    self.stats.delete_failed();
                    error!(
                        part_id = self.part_id,
                        dmap = name,
                        hkey = *hkey,
                        error = %err,
                        "Failed to delete expired key"
                    );
                }
            }
        }
        deleted
    }
}
