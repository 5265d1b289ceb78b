//! Eviction scheduler
//!
//! A single Tokio task ticks at a fixed interval and spawns one
//! [`run_cycle`] per tick without waiting for it, so a slow cycle never delays
//! the next one. In-flight cycles live in a [`JoinSet`] owned by that task.
//! On shutdown the task stops ticking and joins whatever is still running
//! before it returns.
//!
//! ```text
//!  tick ──► cycle ──► janitor × ≤shard_cap
//!  tick ──► cycle ──► janitor × ≤shard_cap      (cycles may overlap)
//!  tick ──► ...
//!  shutdown ──► stop ticking ──► join in-flight cycles ──► done
//! ```
//!
//! Cancellation is a `watch` channel shared with every cycle and janitor;
//! they poll it between batches and unwind on their own.

use super::config::EvictionConfig;
use super::deleter::{ExpiredKeyDeleter, LocalDeleter};
use super::sampler::{run_cycle, CycleContext, CycleReport};
use super::stats::EvictionStats;
use crate::error::ConfigError;
use crate::storage::PartitionTable;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

/// A handle to the running eviction scheduler.
///
/// Dropping the handle signals shutdown; call [`EvictionScheduler::shutdown`]
/// to also wait for in-flight cycles to drain.
#[derive(Debug)]
pub struct EvictionScheduler {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
    stats: Arc<EvictionStats>,
}

impl EvictionScheduler {
    /// Validates `config` and starts the scheduler as a background task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use kvjanitor::eviction::{EvictionConfig, EvictionScheduler, LocalDeleter};
    /// use kvjanitor::storage::PartitionTable;
    /// use std::sync::Arc;
    ///
    /// let table = Arc::new(PartitionTable::new(271)?);
    /// let scheduler = EvictionScheduler::start(
    ///     Arc::clone(&table),
    ///     Arc::new(LocalDeleter),
    ///     EvictionConfig::default(),
    /// )?;
    ///
    /// // ... serve traffic ...
    ///
    /// scheduler.shutdown().await;
    /// ```
    pub fn start(
        table: Arc<PartitionTable>,
        deleter: Arc<dyn ExpiredKeyDeleter>,
        config: EvictionConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(EvictionStats::new());
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        info!(
            interval_ms = config.interval.as_millis() as u64,
            shard_cap = config.shard_cap,
            batch_size = config.batch_size,
            max_total = config.max_total,
            "Background eviction scheduler started"
        );

        let ctx = CycleContext {
            table,
            deleter,
            config: Arc::new(config),
            stats: Arc::clone(&stats),
            shutdown: shutdown_rx,
        };
        let handle = tokio::spawn(scheduler_loop(ctx, rng));

        Ok(Self {
            shutdown_tx,
            handle: Some(handle),
            stats,
        })
    }

    /// Returns the counters shared with every cycle.
    pub fn stats(&self) -> Arc<EvictionStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signals shutdown and waits until every in-flight cycle has finished.
    pub async fn shutdown(mut self) {
        self.shutdown_tx.send_replace(true);
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "Eviction scheduler task failed");
            }
        }
        info!("Background eviction scheduler stopped");
    }
}

impl Drop for EvictionScheduler {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown_tx.send_replace(true);
            debug!("Eviction scheduler dropped, shutdown signalled");
        }
    }
}

/// The timer loop.
async fn scheduler_loop(ctx: CycleContext, mut rng: StdRng) {
    let mut shutdown = ctx.shutdown.clone();
    let mut ticker = tokio::time::interval(ctx.config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // the first tick completes immediately
    ticker.tick().await;

    let mut cycles: JoinSet<CycleReport> = JoinSet::new();
    loop {
        tokio::select! {
            result = shutdown.changed() => {
                if result.is_err() || *shutdown.borrow() {
                    debug!("Eviction scheduler received shutdown signal");
                    break;
                }
            }
            _ = ticker.tick() => {
                trace!(in_flight = cycles.len(), "Eviction tick");
                let cycle_rng = StdRng::seed_from_u64(rng.random());
                cycles.spawn(run_cycle(ctx.clone(), cycle_rng));
            }
            Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                reap(joined);
            }
        }
    }

    let in_flight = cycles.len();
    while let Some(joined) = cycles.join_next().await {
        reap(joined);
    }
    debug!(in_flight, "Eviction cycles drained");
}

fn reap(joined: Result<CycleReport, JoinError>) {
    if let Err(err) = joined {
        warn!(error = %err, "Eviction cycle task failed");
    }
}

/// Starts the scheduler with default configuration and local deletes.
///
/// This is a convenience function for simple use cases.
pub fn start_eviction(table: Arc<PartitionTable>) -> Result<EvictionScheduler, ConfigError> {
    EvictionScheduler::start(table, Arc::new(LocalDeleter), EvictionConfig::default())
}
