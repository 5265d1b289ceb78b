//! Storage Module
//!
//! The partitioned keyspace the eviction sweep runs against.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PartitionTable                          │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────┐            │
//! │  │ Partition 0 │ │ Partition 1 │ │ ...N        │            │
//! │  │  RwLock<    │ │  RwLock<    │ │ partitions  │            │
//! │  │  name→DMap> │ │  name→DMap> │ │             │            │
//! │  └─────────────┘ └─────────────┘ └─────────────┘            │
//! └─────────────────────────────────────────────────────────────┘
//!         each DMap: Mutex<Storage>, hkey → VData
//! ```
//!
//! ## Example
//!
//! ```
//! use kvjanitor::storage::PartitionTable;
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! let table = PartitionTable::new(7).unwrap();
//!
//! table.put("users", "name", Bytes::from("Ariz"), None);
//! assert_eq!(table.get("users", "name"), Some(Bytes::from("Ariz")));
//!
//! // Set with TTL
//! table.put(
//!     "sessions",
//!     "token",
//!     Bytes::from("abc123"),
//!     Some(Duration::from_secs(3600)),
//! );
//! assert_eq!(table.len(), 2);
//! ```

pub mod dmap;
pub mod partition;

// Re-export commonly used types
pub use dmap::{DMap, Storage, VData};
pub use partition::{hash_key, Partition, PartitionTable};
