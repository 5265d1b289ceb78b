//! # kvjanitor - Active Expiration for a Partitioned In-Memory Store
//!
//! kvjanitor reclaims expired keys from a partitioned, in-memory key-value
//! store in the background, without a global lock, without scanning the whole
//! dataset, and without starving foreground traffic.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌──────────────────┐                                                   │
//! │  │ EvictionScheduler│  tick every 100ms                                 │
//! │  └────────┬─────────┘                                                   │
//! │           │ one cycle per tick                                          │
//! │           ▼                                                             │
//! │  ┌──────────────────┐    ┌──────────────────────────────────────────┐   │
//! │  │ Partition Sampler│───>│              PartitionTable              │   │
//! │  │ (random part,    │    │  ┌────────┐ ┌────────┐ ┌────────┐        │   │
//! │  │  ≤20 DMaps)      │    │  │Part 0  │ │Part 1  │ │...N    │        │   │
//! │  └────────┬─────────┘    │  │ DMaps  │ │ DMaps  │ │        │        │   │
//! │           │              │  └────────┘ └────────┘ └────────┘        │   │
//! │           ▼              └──────────────────────────────────────────┘   │
//! │  ┌──────────────────┐                  ▲                                │
//! │  │ Shard Janitors   │──────────────────┘ delete expired, under lock     │
//! │  │ (blocking pool)  │                                                   │
//! │  └──────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use kvjanitor::eviction::start_eviction;
//! use kvjanitor::storage::PartitionTable;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let table = Arc::new(PartitionTable::new(271)?);
//!     let scheduler = start_eviction(Arc::clone(&table))?;
//!
//!     // ... writes with TTLs go through `table.put` ...
//!
//!     scheduler.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`time`]: clock abstraction and the expiration predicate
//! - [`storage`]: partitions, DMaps and their entries
//! - [`eviction`]: scheduler, partition sampler and shard janitor
//! - [`error`]: error types
//!
//! ## Design Highlights
//!
//! ### Bounded work
//!
//! A cycle touches one partition and at most `shard_cap` DMaps. A janitor
//! inspects at most `batch_size` entries per batch and stops once it has
//! deleted more than `max_total`, so the time any DMap lock is held stays
//! small no matter how large the DMap is.
//!
//! ### Adaptive sweeping
//!
//! A janitor keeps going only while a batch finds at least 25% expired keys,
//! so effort follows expired-key density rather than DMap size.
//!
//! ### Cooperative shutdown
//!
//! Every task shares one cancellation signal. The scheduler stops ticking and
//! joins the cycles still in flight; janitors check the signal before each
//! batch and release their lock on the way out.

pub mod error;
pub mod eviction;
pub mod storage;
pub mod time;

// Re-export commonly used types for convenience
pub use error::{ConfigError, DeleteError};
pub use eviction::{
    start_eviction, EvictionConfig, EvictionScheduler, ExpiredKeyDeleter, LocalDeleter,
};
pub use storage::{DMap, PartitionTable, VData};
pub use time::{is_expired, Clock, SystemClock, NO_EXPIRY};

/// Version of kvjanitor
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
