//! Throughput Benchmark for kvjanitor
//!
//! Measures the write path and the cost of a janitor pass over DMaps with
//! different expired-key densities.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use kvjanitor::eviction::{EvictionConfig, EvictionStats, Janitor, LocalDeleter};
use kvjanitor::storage::{DMap, PartitionTable, VData};
use kvjanitor::time::ManualClock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::sync::watch;

const NOW: u64 = 1_000_000;

/// Builds a DMap of `total` entries where every `1 / expired_every` is expired.
fn build_dmap(total: u64, expired_every: u64) -> DMap {
    let dmap = DMap::new("bench");
    {
        let mut storage = dmap.lock();
        for i in 0..total {
            let ttl = if expired_every > 0 && i % expired_every == 0 {
                NOW - 1
            } else {
                NOW + 60_000
            };
            storage.insert(i, VData::new(format!("key:{i}"), Bytes::from("value"), ttl));
        }
    }
    dmap
}

/// Benchmark PUT operations
fn bench_put(c: &mut Criterion) {
    let table = PartitionTable::new(271).unwrap();

    let mut group = c.benchmark_group("put");
    group.throughput(Throughput::Elements(1));

    group.bench_function("put_persistent", |b| {
        let mut i = 0u64;
        b.iter(|| {
            table.put("bench", &format!("key:{i}"), Bytes::from("small_value"), None);
            i += 1;
        });
    });

    group.bench_function("put_with_ttl", |b| {
        let mut i = 0u64;
        b.iter(|| {
            table.put(
                "bench",
                &format!("ttl:{i}"),
                Bytes::from("small_value"),
                Some(Duration::from_secs(60)),
            );
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark a single janitor invocation
fn bench_janitor(c: &mut Criterion) {
    let config = EvictionConfig::default();
    let clock = ManualClock::new(NOW);
    let stats = EvictionStats::new();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let janitor = Janitor {
        part_id: 0,
        config: &config,
        deleter: &LocalDeleter,
        clock: &clock,
        shutdown: &shutdown_rx,
        stats: &stats,
    };

    let mut group = c.benchmark_group("janitor");

    group.bench_function("clean_100k", |b| {
        let dmap = build_dmap(100_000, 0);
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| black_box(janitor.scan(&dmap, &mut rng)));
    });

    for (name, every) in [("sparse_100k", 10), ("dense_100k", 1)] {
        group.bench_function(name, |b| {
            let mut rng = StdRng::seed_from_u64(2);
            b.iter_batched(
                || build_dmap(100_000, every),
                |dmap| black_box(janitor.scan(&dmap, &mut rng)),
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_put, bench_janitor);
criterion_main!(benches);
