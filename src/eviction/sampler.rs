//! Partition sampler: one eviction cycle
//!
//! A cycle picks one partition at random, selects up to `shard_cap` of its
//! DMaps starting from a random position, and runs a [`Janitor`] for each on
//! the blocking pool. The cycle returns once every janitor it launched has
//! finished.

use super::config::EvictionConfig;
use super::deleter::ExpiredKeyDeleter;
use super::janitor::Janitor;
use super::stats::EvictionStats;
use crate::storage::PartitionTable;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Shared state every cycle runs against.
#[derive(Clone)]
pub struct CycleContext {
    pub table: Arc<PartitionTable>,
    pub deleter: Arc<dyn ExpiredKeyDeleter>,
    pub config: Arc<EvictionConfig>,
    pub stats: Arc<EvictionStats>,
    pub shutdown: watch::Receiver<bool>,
}

/// What one cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub part_id: usize,
    pub dmaps_scanned: usize,
    pub deleted: usize,
}

/// Runs one eviction cycle over a randomly chosen partition.
pub async fn run_cycle(ctx: CycleContext, mut rng: StdRng) -> CycleReport {
    let part_id = rng.random_range(0..ctx.table.partition_count());
    let mut report = CycleReport {
        part_id,
        ..Default::default()
    };

    if *ctx.shutdown.borrow() {
        return report;
    }
    let Some(partition) = ctx.table.partition(part_id) else {
        return report;
    };

    let shard_cap = ctx.config.shard_cap;
    let mut janitors = JoinSet::new();
    // counts across every visitor call; reaching the cap ends enumeration
    let mut selected = 0;
    let start = rng.random_range(0..partition.dmap_count().max(1));

    partition.for_each_dmap_from(start, |_, dmap| {
        if selected >= shard_cap {
            return false;
        }
        selected += 1;

        let dmap = Arc::clone(dmap);
        let ctx = ctx.clone();
        let mut janitor_rng = StdRng::seed_from_u64(rng.random());
        janitors.spawn_blocking(move || {
            let janitor = Janitor {
                part_id,
                config: &ctx.config,
                deleter: ctx.deleter.as_ref(),
                clock: ctx.table.clock(),
                shutdown: &ctx.shutdown,
                stats: &ctx.stats,
            };
            janitor.scan(&dmap, &mut janitor_rng)
        });

        selected < shard_cap
    });

    while let Some(joined) = janitors.join_next().await {
        match joined {
            Ok(scan) => {
                report.dmaps_scanned += 1;
                report.deleted += scan.deleted;
            }
            Err(err) => warn!(part_id, error = %err, "Eviction janitor task failed"),
        }
    }

    ctx.stats.cycle_completed();
    if report.deleted > 0 {
        debug!(
            part_id,
            dmaps = report.dmaps_scanned,
            deleted = report.deleted,
            "Eviction cycle finished"
        );
    }

    report
}
