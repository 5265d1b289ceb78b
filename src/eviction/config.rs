//! Tunables for the eviction sweep.

use crate::error::ConfigError;
use std::time::Duration;

/// Configuration for the background eviction sweep.
///
/// Every field has a default matching the reference behaviour; override only
/// what you need:
///
/// ```
/// use kvjanitor::eviction::EvictionConfig;
/// use std::time::Duration;
///
/// let config = EvictionConfig {
///     interval: Duration::from_millis(10),
///     seed: Some(7),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// assert_eq!(config.batch_size, 20);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EvictionConfig {
    /// Time between cycles (default: 100ms)
    pub interval: Duration,

    /// Maximum DMaps scanned per cycle (default: 20)
    pub shard_cap: usize,

    /// Maximum entries inspected per janitor batch (default: 20)
    pub batch_size: usize,

    /// Keep sweeping a DMap while at least this fraction of a batch was
    /// deleted (default: 0.25)
    pub continue_ratio: f64,

    /// Stop sweeping a DMap once more than this many keys were deleted in one
    /// invocation (default: 100)
    pub max_total: usize,

    /// Seed for partition/shard/slot selection; `None` draws from the OS
    pub seed: Option<u64>,
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            shard_cap: 20,
            batch_size: 20,
            continue_ratio: 0.25,
            max_total: 100,
            seed: None,
        }
    }
}

impl EvictionConfig {
    /// Checks that the sweep can make progress with these values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.shard_cap == 0 {
            return Err(ConfigError::ZeroShardCap);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        // NaN fails both comparisons
        if !(self.continue_ratio > 0.0 && self.continue_ratio <= 1.0) {
            return Err(ConfigError::InvalidRatio(self.continue_ratio));
        }
        Ok(())
    }

    /// Whether a batch that deleted `deleted` keys warrants another batch.
    #[inline]
    pub(crate) fn batch_is_hot(&self, deleted: usize) -> bool {
        deleted as f64 / self.batch_size as f64 >= self.continue_ratio
    }
}
