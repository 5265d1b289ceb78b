//! Per-shard storage ("DMap")
//!
//! A DMap is one independently-locked key→entry container inside a partition.
//! Entries are indexed by a 64-bit key hash. Every access goes through
//! [`DMap::lock`], so the foreign write path and the eviction janitor are
//! serialized on the same mutex.
//!
//! ## Layout
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │ DMap "sessions"                            │
//! │  Mutex<Storage>                            │
//! │   index: HashMap<hkey, slot>               │
//! │   slots: [ (hkey, VData) | (hkey, VData) … ]│
//! └────────────────────────────────────────────┘
//! ```
//!
//! Slots are kept dense (removal is a swap-remove that patches the index) so
//! the janitor can start enumeration at a uniformly random position in O(1)
//! instead of always sampling the same head of the map.

use crate::time::{is_expired, NO_EXPIRY};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One stored key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VData {
    /// The original key
    pub key: String,
    /// Opaque value payload
    pub value: Bytes,
    /// Absolute expiry in Unix milliseconds ([`NO_EXPIRY`] = never)
    pub ttl: u64,
}

impl VData {
    pub fn new(key: impl Into<String>, value: Bytes, ttl: u64) -> Self {
        Self {
            key: key.into(),
            value,
            ttl,
        }
    }

    /// Creates an entry that never expires.
    pub fn persistent(key: impl Into<String>, value: Bytes) -> Self {
        Self::new(key, value, NO_EXPIRY)
    }

    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        is_expired(self.ttl, now)
    }
}

/// The hash→entry map guarded by a DMap's lock.
#[derive(Debug, Default)]
pub struct Storage {
    index: HashMap<u64, usize>,
    slots: Vec<(u64, VData)>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, hkey: u64) -> Option<&VData> {
        self.index.get(&hkey).map(|&slot| &self.slots[slot].1)
    }

    /// Inserts or replaces the entry for `hkey`, returning the previous one.
    pub fn insert(&mut self, hkey: u64, vdata: VData) -> Option<VData> {
        match self.index.get(&hkey) {
            Some(&slot) => Some(std::mem::replace(&mut self.slots[slot].1, vdata)),
            None => {
                self.index.insert(hkey, self.slots.len());
                self.slots.push((hkey, vdata));
                None
            }
        }
    }

    /// Removes the entry for `hkey`.
    ///
    /// Returns `None` if the hash is not present; a second delete of the same
    /// hash is a no-op.
    pub fn delete(&mut self, hkey: u64) -> Option<VData> {
        let slot = self.index.remove(&hkey)?;
        let (_, removed) = self.slots.swap_remove(slot);
        if let Some((moved, _)) = self.slots.get(slot) {
            self.index.insert(*moved, slot);
        }
        Some(removed)
    }

    /// Visits every entry until the visitor returns `false`.
    pub fn for_each<F>(&self, visitor: F)
    where
        F: FnMut(u64, &VData) -> bool,
    {
        self.for_each_from(0, visitor);
    }

    /// Visits every entry starting at slot `start` (modulo length) and
    /// wrapping around, until the visitor returns `false`.
    pub fn for_each_from<F>(&self, start: usize, mut visitor: F)
    where
        F: FnMut(u64, &VData) -> bool,
    {
        let len = self.slots.len();
        if len == 0 {
            return;
        }
        let start = start % len;
        let (tail, head) = (&self.slots[start..], &self.slots[..start]);
        for (hkey, vdata) in tail.iter().chain(head) {
            if !visitor(*hkey, vdata) {
                break;
            }
        }
    }
}

/// A named, independently-locked shard.
#[derive(Debug)]
pub struct DMap {
    name: String,
    storage: Mutex<Storage>,
}

impl DMap {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage: Mutex::new(Storage::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquires the shard's exclusive lock.
    ///
    /// A poisoned lock is recovered: the storage has no invariants a panicking
    /// holder could leave half-applied across calls.
    pub fn lock(&self) -> MutexGuard<'_, Storage> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(i: u64, ttl: u64) -> VData {
        VData::new(format!("key:{i}"), Bytes::from("val"), ttl)
    }

    #[test]
    fn test_insert_get_replace() {
        let mut storage = Storage::new();
        assert!(storage.insert(1, entry(1, 0)).is_none());
        let old = storage.insert(1, entry(1, 500));
        assert_eq!(old.map(|v| v.ttl), Some(0));
        assert_eq!(storage.get(1).map(|v| v.ttl), Some(500));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_delete_twice_is_noop() {
        let mut storage = Storage::new();
        for i in 0..5 {
            storage.insert(i, entry(i, 0));
        }

        assert!(storage.delete(2).is_some());
        assert!(storage.delete(2).is_none());
        assert_eq!(storage.len(), 4);

        // every remaining hash still resolves to its own entry
        for i in [0, 1, 3, 4] {
            assert_eq!(storage.get(i).map(|v| v.key.clone()), Some(format!("key:{i}")));
        }
        assert!(storage.get(2).is_none());
    }

    #[test]
    fn test_delete_last_slot() {
        let mut storage = Storage::new();
        storage.insert(10, entry(10, 0));
        storage.insert(11, entry(11, 0));
        assert!(storage.delete(11).is_some());
        assert_eq!(storage.get(10).map(|v| v.key.as_str()), Some("key:10"));
        assert!(storage.delete(10).is_some());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_for_each_from_wraps_and_stops() {
        let mut storage = Storage::new();
        for i in 0..6 {
            storage.insert(i, entry(i, 0));
        }

        let mut seen = Vec::new();
        storage.for_each_from(4, |hkey, _| {
            seen.push(hkey);
            true
        });
        assert_eq!(seen, vec![4, 5, 0, 1, 2, 3]);

        let mut visited = 0;
        storage.for_each_from(17, |_, _| {
            visited += 1;
            visited < 3
        });
        assert_eq!(visited, 3);
    }

    #[test]
    fn test_for_each_on_empty() {
        let storage = Storage::new();
        let mut visited = 0;
        storage.for_each(|_, _| {
            visited += 1;
            true
        });
        assert_eq!(visited, 0);
    }

    #[test]
    fn test_vdata_expiry() {
        assert!(!VData::persistent("k", Bytes::new()).is_expired(u64::MAX));
        assert!(entry(1, 100).is_expired(100));
        assert!(!entry(1, 100).is_expired(99));
    }

    #[test]
    fn test_dmap_lock_recovers_from_poison() {
        use std::sync::Arc;

        let dmap = Arc::new(DMap::new("poisoned"));
        dmap.lock().insert(1, entry(1, 0));

        let cloned = Arc::clone(&dmap);
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(dmap.len(), 1);
        assert_eq!(dmap.name(), "poisoned");
    }
}
