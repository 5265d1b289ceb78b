//! Active Expiration Module
//!
//! Background eviction of expired keys across the partitioned keyspace.
//! Passive checks on read hide expired values but never reclaim them; this
//! module is what eventually frees keys nobody reads again.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ EvictionScheduler (one Tokio task, ticks every `interval`)   │
//! └──────────────┬───────────────────────────────────────────────┘
//!                │ spawn per tick (JoinSet, not awaited)
//!                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │ run_cycle: random partition, ≤ shard_cap DMaps               │
//! └──────┬──────────────┬──────────────┬─────────────────────────┘
//!        │ spawn_blocking, joined before the cycle ends
//!        ▼              ▼              ▼
//!   ┌─────────┐    ┌─────────┐    ┌─────────┐
//!   │ Janitor │    │ Janitor │    │ Janitor │   one DMap lock each
//!   └─────────┘    └─────────┘    └─────────┘
//! ```
//!
//! ## Tunables
//!
//! See [`EvictionConfig`]: `interval` (100ms), `shard_cap` (20),
//! `batch_size` (20), `continue_ratio` (25%), `max_total` (100).

pub mod config;
pub mod deleter;
pub mod janitor;
pub mod sampler;
pub mod scheduler;
pub mod stats;

// Re-export commonly used types
pub use config::EvictionConfig;
pub use deleter::{ExpiredKey, ExpiredKeyDeleter, LocalDeleter};
pub use janitor::{Janitor, ScanReport, StopReason};
pub use sampler::{run_cycle, CycleContext, CycleReport};
pub use scheduler::{start_eviction, EvictionScheduler};
pub use stats::{EvictionStats, EvictionStatsSnapshot};
