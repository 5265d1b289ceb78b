//! Partition registry and the foreign write path
//!
//! The keyspace is split into a fixed number of partitions, created once when
//! the [`PartitionTable`] is built. Each partition holds a concurrent
//! name→[`DMap`] mapping; DMaps are created lazily by the first write that
//! targets them.
//!
//! ```text
//! PartitionTable
//!  ├── Partition 0 ── { "users": DMap, "sessions": DMap }
//!  ├── Partition 1 ── { "sessions": DMap }
//!  └── Partition N ── { ... }
//! ```
//!
//! A key lands in partition `hash(key) % partition_count`, inside the DMap
//! named by the caller.

use super::dmap::{DMap, VData};
use crate::error::ConfigError;
use crate::time::{expiry_from_ttl, Clock, SystemClock};
use bytes::Bytes;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Computes the 64-bit hash used to index entries.
#[inline]
pub fn hash_key(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// One partition: a bucket of named DMaps.
#[derive(Debug)]
pub struct Partition {
    id: usize,
    dmaps: RwLock<HashMap<String, Arc<DMap>>>,
}

impl Partition {
    fn new(id: usize) -> Self {
        Self {
            id,
            dmaps: RwLock::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn dmap(&self, name: &str) -> Option<Arc<DMap>> {
        self.dmaps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Returns the named DMap, creating it if missing.
    pub fn get_or_create(&self, name: &str) -> Arc<DMap> {
        if let Some(dmap) = self.dmap(name) {
            return dmap;
        }
        let mut dmaps = self.dmaps.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            dmaps
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(DMap::new(name))),
        )
    }

    pub fn dmap_count(&self) -> usize {
        self.dmaps.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Enumerates DMaps starting at position `start` (modulo count), wrapping
    /// around, until the visitor returns `false`.
    ///
    /// The partition's read lock is held for the whole enumeration, so the
    /// visitor must not block.
    pub fn for_each_dmap_from<F>(&self, start: usize, mut visitor: F)
    where
        F: FnMut(&str, &Arc<DMap>) -> bool,
    {
        let dmaps = self.dmaps.read().unwrap_or_else(PoisonError::into_inner);
        let count = dmaps.len();
        if count == 0 {
            return;
        }
        for (name, dmap) in dmaps.iter().cycle().skip(start % count).take(count) {
            if !visitor(name.as_str(), dmap) {
                break;
            }
        }
    }

    /// Total number of entries across this partition's DMaps.
    pub fn len(&self) -> usize {
        self.dmaps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|dmap| dmap.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The fixed set of partitions on this node, plus the clock used to stamp TTLs.
pub struct PartitionTable {
    partitions: Vec<Partition>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for PartitionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionTable")
            .field("partitions", &self.partitions.len())
            .finish()
    }
}

impl PartitionTable {
    /// Creates `count` empty partitions using the system clock.
    pub fn new(count: usize) -> Result<Self, ConfigError> {
        Self::with_clock(count, Arc::new(SystemClock))
    }

    pub fn with_clock(count: usize, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::ZeroPartitions);
        }
        Ok(Self {
            partitions: (0..count).map(Partition::new).collect(),
            clock,
        })
    }

    #[inline]
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn partition(&self, id: usize) -> Option<&Partition> {
        self.partitions.get(id)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    #[inline]
    pub fn partition_id(&self, hkey: u64) -> usize {
        (hkey % self.partitions.len() as u64) as usize
    }

    fn locate(&self, key: &str) -> (u64, &Partition) {
        let hkey = hash_key(key);
        (hkey, &self.partitions[self.partition_id(hkey)])
    }

    /// Stores `value` under `key` in the named DMap.
    ///
    /// Returns `true` if a new key was created, `false` if an existing one was
    /// replaced.
    pub fn put(&self, dmap: &str, key: &str, value: Bytes, ttl: Option<Duration>) -> bool {
        let (hkey, partition) = self.locate(key);
        let expires = expiry_from_ttl(self.clock(), ttl);
        partition
            .get_or_create(dmap)
            .lock()
            .insert(hkey, VData::new(key, value, expires))
            .is_none()
    }

    /// Returns the value for `key`, hiding entries whose TTL has passed.
    ///
    /// Reads never delete; reclaiming expired entries is the sweeper's job.
    pub fn get(&self, dmap: &str, key: &str) -> Option<Bytes> {
        let (hkey, partition) = self.locate(key);
        let now = self.clock.now_ms();
        let dmap = partition.dmap(dmap)?;
        let storage = dmap.lock();
        storage
            .get(hkey)
            .filter(|vdata| !vdata.is_expired(now))
            .map(|vdata| vdata.value.clone())
    }

    /// Returns `true` if the key is physically stored, expired or not.
    pub fn contains(&self, dmap: &str, key: &str) -> bool {
        let (hkey, partition) = self.locate(key);
        partition
            .dmap(dmap)
            .map(|dmap| {
                let storage = dmap.lock();
                storage.get(hkey).is_some()
            })
            .unwrap_or(false)
    }

    /// Removes `key` from the named DMap.
    pub fn delete(&self, dmap: &str, key: &str) -> bool {
        let (hkey, partition) = self.locate(key);
        partition
            .dmap(dmap)
            .map(|dmap| {
                let mut storage = dmap.lock();
                storage.delete(hkey).is_some()
            })
            .unwrap_or(false)
    }

    /// Total number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.partitions.iter().map(Partition::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;

    fn table(count: usize) -> (PartitionTable, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let table = PartitionTable::with_clock(count, clock.clone()).unwrap();
        (table, clock)
    }

    #[test]
    fn test_zero_partitions_rejected() {
        assert_eq!(
            PartitionTable::new(0).unwrap_err(),
            ConfigError::ZeroPartitions
        );
    }

    #[test]
    fn test_put_get_delete() {
        let (table, _) = table(7);
        assert!(table.put("users", "alice", Bytes::from("1"), None));
        assert!(!table.put("users", "alice", Bytes::from("2"), None));
        assert_eq!(table.get("users", "alice"), Some(Bytes::from("2")));
        assert_eq!(table.get("other", "alice"), None);

        assert!(table.delete("users", "alice"));
        assert!(!table.delete("users", "alice"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_get_hides_expired_without_deleting() {
        let (table, clock) = table(3);
        table.put("s", "token", Bytes::from("x"), Some(Duration::from_millis(50)));
        assert!(table.get("s", "token").is_some());

        clock.advance(Duration::from_millis(50));
        assert!(table.get("s", "token").is_none());
        assert!(table.contains("s", "token"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_keys_land_in_hashed_partition() {
        let (table, _) = table(13);
        for i in 0..200 {
            let key = format!("key:{i}");
            table.put("m", &key, Bytes::new(), None);
            let part = table.partition(table.partition_id(hash_key(&key))).unwrap();
            assert!(part.dmap("m").unwrap().lock().get(hash_key(&key)).is_some());
        }
        assert_eq!(table.len(), 200);
    }

    #[test]
    fn test_for_each_dmap_from_visits_each_once() {
        let part = Partition::new(0);
        for name in ["a", "b", "c", "d"] {
            part.get_or_create(name);
        }
        assert_eq!(part.dmap_count(), 4);

        for start in 0..9 {
            let mut seen = Vec::new();
            part.for_each_dmap_from(start, |name, _| {
                seen.push(name.to_string());
                true
            });
            seen.sort();
            assert_eq!(seen, vec!["a", "b", "c", "d"]);
        }

        let mut visited = 0;
        part.for_each_dmap_from(1, |_, _| {
            visited += 1;
            false
        });
        assert_eq!(visited, 1);
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let part = Partition::new(2);
        let a = part.get_or_create("x");
        let b = part.get_or_create("x");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(part.id(), 2);
    }
}
