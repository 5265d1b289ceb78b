//! The delete operation the janitor calls for each expired entry.
//!
//! The janitor only decides *what* is expired. Removing it is delegated to an
//! [`ExpiredKeyDeleter`], which is where a clustered store hooks replication
//! or keyspace notifications in. It is always called with the shard lock held
//! and the locked [`Storage`] passed in, so implementations must not try to
//! re-lock the DMap.

use crate::error::DeleteError;
use crate::storage::Storage;

/// Identifies one expired entry picked by a janitor batch.
#[derive(Debug, Clone, Copy)]
pub struct ExpiredKey<'a> {
    pub part_id: usize,
    pub dmap: &'a str,
    pub hkey: u64,
    pub key: &'a str,
}

/// Removes expired entries on behalf of the janitor.
pub trait ExpiredKeyDeleter: Send + Sync + 'static {
    /// Deletes `target` from `storage`.
    ///
    /// An `Err` leaves the entry for a later cycle; it never aborts the sweep.
    fn delete(&self, target: &ExpiredKey<'_>, storage: &mut Storage) -> Result<(), DeleteError>;
}

/// Deletes from the local shard only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDeleter;

impl ExpiredKeyDeleter for LocalDeleter {
    fn delete(&self, target: &ExpiredKey<'_>, storage: &mut Storage) -> Result<(), DeleteError> {
        storage
            .delete(target.hkey)
            .map(|_| ())
            .ok_or(DeleteError::NotFound { hkey: target.hkey })
    }
}
