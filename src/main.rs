//! kvjanitor - standalone eviction node
//!
//! Builds a partition table, optionally seeds it with short-lived demo keys,
//! and runs the background eviction scheduler until Ctrl+C.

use anyhow::{bail, Context};
use bytes::Bytes;
use kvjanitor::eviction::{EvictionConfig, EvictionScheduler, LocalDeleter};
use kvjanitor::storage::PartitionTable;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Node configuration
struct Config {
    /// Number of partitions in the table
    partitions: usize,
    /// Eviction tunables
    eviction: EvictionConfig,
    /// Number of demo keys to write on startup
    demo_keys: usize,
    /// TTL given to demo keys
    demo_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            partitions: 271,
            eviction: EvictionConfig::default(),
            demo_keys: 0,
            demo_ttl: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> anyhow::Result<Self> {
        Self::parse(std::env::args().skip(1))
    }

    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut config = Config::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--partitions" => config.partitions = value(&mut args, &arg)?,
                "--interval-ms" => {
                    config.eviction.interval = Duration::from_millis(value(&mut args, &arg)?)
                }
                "--shard-cap" => config.eviction.shard_cap = value(&mut args, &arg)?,
                "--batch-size" => config.eviction.batch_size = value(&mut args, &arg)?,
                "--ratio" => config.eviction.continue_ratio = value(&mut args, &arg)?,
                "--max-total" => config.eviction.max_total = value(&mut args, &arg)?,
                "--seed" => config.eviction.seed = Some(value(&mut args, &arg)?),
                "--demo-keys" => config.demo_keys = value(&mut args, &arg)?,
                "--demo-ttl-ms" => {
                    config.demo_ttl = Duration::from_millis(value(&mut args, &arg)?)
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("kvjanitor version {}", kvjanitor::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    print_help();
                    bail!("unknown argument: {arg}");
                }
            }
        }

        if config.partitions == 0 {
            bail!("--partitions must be at least 1");
        }
        config.eviction.validate()?;
        Ok(config)
    }
}

/// Reads and parses the value following `flag`.
fn value<T>(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = args.next() else {
        bail!("{flag} requires a value");
    };
    raw.parse()
        .with_context(|| format!("invalid value for {flag}: {raw}"))
}

fn print_help() {
    println!(
        r#"
kvjanitor - Active TTL expiration for a partitioned in-memory store

USAGE:
    kvjanitor [OPTIONS]

OPTIONS:
        --partitions <N>      Number of partitions (default: 271)
        --interval-ms <MS>    Time between eviction cycles (default: 100)
        --shard-cap <N>       DMaps scanned per cycle (default: 20)
        --batch-size <N>      Entries inspected per batch (default: 20)
        --ratio <F>           Keep sweeping while this fraction expires (default: 0.25)
        --max-total <N>       Deletions per DMap per cycle before stopping (default: 100)
        --seed <N>            Seed for random selection (default: OS entropy)
        --demo-keys <N>       Write N demo keys with a TTL on startup (default: 0)
        --demo-ttl-ms <MS>    TTL for demo keys (default: 1000)
    -v, --version             Print version information
        --help                Print this help message

Log verbosity follows RUST_LOG (default: info), e.g. RUST_LOG=kvjanitor=debug
"#
    );
}

/// Spreads `count` keys with `ttl` over a handful of DMaps.
fn seed_demo_keys(table: &PartitionTable, count: usize, ttl: Duration) {
    for i in 0..count {
        let dmap = format!("demo:{}", i % 8);
        table.put(&dmap, &format!("key:{i}"), Bytes::from("value"), Some(ttl));
    }
    info!(keys = count, ttl_ms = ttl.as_millis() as u64, "Demo keys written");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_args()?;

    let table = Arc::new(PartitionTable::new(config.partitions)?);
    info!(
        partitions = table.partition_count(),
        "Partition table initialized"
    );

    if config.demo_keys > 0 {
        seed_demo_keys(&table, config.demo_keys, config.demo_ttl);
    }

    let scheduler = EvictionScheduler::start(
        Arc::clone(&table),
        Arc::new(LocalDeleter),
        config.eviction.clone(),
    )?;
    let stats = scheduler.stats();

    signal::ctrl_c()
        .await
        .context("failed to install Ctrl+C handler")?;
    info!("Shutdown signal received, draining eviction cycles...");

    scheduler.shutdown().await;

    let snapshot = stats.snapshot();
    info!(
        cycles = snapshot.cycles,
        dmaps_scanned = snapshot.dmaps_scanned,
        keys_evicted = snapshot.keys_evicted,
        delete_failures = snapshot.delete_failures,
        keys_remaining = table.len(),
        "Shutdown complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<Config> {
        Config::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn test_parse_defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.partitions, 271);
        assert_eq!(config.eviction, EvictionConfig::default());
        assert_eq!(config.demo_keys, 0);
    }

    #[test]
    fn test_parse_overrides() {
        let config = parse(&[
            "--partitions",
            "7",
            "--interval-ms",
            "250",
            "--shard-cap",
            "4",
            "--seed",
            "9",
        ])
        .unwrap();
        assert_eq!(config.partitions, 7);
        assert_eq!(config.eviction.interval, Duration::from_millis(250));
        assert_eq!(config.eviction.shard_cap, 4);
        assert_eq!(config.eviction.seed, Some(9));
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(parse(&["--partitions", "0"]).is_err());
        assert!(parse(&["--batch-size", "0"]).is_err());
        assert!(parse(&["--ratio", "abc"]).is_err());
        assert!(parse(&["--max-total"]).is_err());
    }
}
