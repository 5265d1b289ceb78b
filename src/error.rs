//! Error types shared by the storage and eviction layers.

use thiserror::Error;

/// Failure of a single expired-key deletion.
///
/// Always transient from the janitor's point of view: the entry stays in
/// place and is picked up again by a later cycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeleteError {
    /// The hash was not present in the shard (already removed).
    #[error("key hash {hkey} not found")]
    NotFound { hkey: u64 },

    /// The delete operation (replication, notification, ...) refused or failed.
    #[error("delete failed: {0}")]
    Backend(String),
}

/// Invalid eviction or table configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("sweep interval must be greater than zero")]
    ZeroInterval,

    #[error("shard cap must be at least 1")]
    ZeroShardCap,

    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    #[error("continue ratio must be in (0, 1], got {0}")]
    InvalidRatio(f64),

    #[error("partition count must be at least 1")]
    ZeroPartitions,
}
