//! Storage abstraction over named cache generations.

use async_trait::async_trait;

use super::entry::CacheEntry;
use crate::Error;

/// Named, versioned key-value stores of request key to stored response.
///
/// Implementations must give `put` overwrite semantics (one entry per key
/// per generation) and make `put_all` all-or-nothing.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the generation if it does not exist yet.
    async fn open(&self, generation: &str) -> Result<(), Error>;

    /// Generation names in creation order.
    async fn generations(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation and everything in it. Returns false if it did not exist.
    async fn delete_generation(&self, generation: &str) -> Result<bool, Error>;

    async fn get(&self, generation: &str, key: &str) -> Result<Option<CacheEntry>, Error>;

    /// Store an entry, creating the generation if needed.
    async fn put(&self, generation: &str, entry: &CacheEntry) -> Result<(), Error>;

    /// Create `generation` and store every entry, or change nothing.
    async fn put_all(&self, generation: &str, entries: &[CacheEntry]) -> Result<(), Error>;

    /// First entry for `key` across all generations, oldest generation first.
    async fn match_any(&self, key: &str) -> Result<Option<CacheEntry>, Error>;

    /// Entries stored in a generation, in first-insertion order.
    async fn entries(&self, generation: &str) -> Result<Vec<CacheEntry>, Error>;
}
