//! In-memory cache generations.
//!
//! Same contract as the SQLite backend, kept behind a tokio `RwLock`. Counts
//! reads and writes and can be told to reject writes, which lets tests assert
//! that a request never touched storage or that a full quota is survivable.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::entry::CacheEntry;
use super::storage::CacheStorage;
use crate::Error;

#[derive(Debug, Default)]
struct Generation {
    name: String,
    entries: Vec<CacheEntry>,
}

impl Generation {
    fn upsert(&mut self, entry: CacheEntry) {
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    reads: AtomicUsize,
    writes: AtomicUsize,
}

/// Volatile [`CacheStorage`]. Cloning shares the same generations.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    generations: Arc<RwLock<Vec<Generation>>>,
    counters: Arc<Counters>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read operations served so far.
    pub fn reads(&self) -> usize {
        self.counters.reads.load(Ordering::SeqCst)
    }

    /// Number of write operations attempted so far.
    pub fn writes(&self) -> usize {
        self.counters.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail as if the quota were exhausted.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn read(&self) {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) -> Result<(), Error> {
        self.counters.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage("quota exceeded".into()));
        }
        Ok(())
    }
}

fn find_or_create<'a>(generations: &'a mut Vec<Generation>, name: &str) -> &'a mut Generation {
    let index = match generations.iter().position(|g| g.name == name) {
        Some(index) => index,
        None => {
            generations.push(Generation { name: name.to_string(), entries: Vec::new() });
            generations.len() - 1
        }
    };
    &mut generations[index]
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        self.write()?;
        let mut generations = self.generations.write().await;
        find_or_create(&mut generations, generation);
        Ok(())
    }

    async fn generations(&self) -> Result<Vec<String>, Error> {
        self.read();
        let generations = self.generations.read().await;
        Ok(generations.iter().map(|g| g.name.clone()).collect())
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, Error> {
        self.write()?;
        let mut generations = self.generations.write().await;
        let before = generations.len();
        generations.retain(|g| g.name != generation);
        Ok(generations.len() < before)
    }

    async fn get(&self, generation: &str, key: &str) -> Result<Option<CacheEntry>, Error> {
        self.read();
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .find(|g| g.name == generation)
            .and_then(|g| g.entries.iter().find(|e| e.key == key))
            .cloned())
    }

    async fn put(&self, generation: &str, entry: &CacheEntry) -> Result<(), Error> {
        self.write()?;
        let mut generations = self.generations.write().await;
        find_or_create(&mut generations, generation).upsert(entry.clone());
        Ok(())
    }

    async fn put_all(&self, generation: &str, entries: &[CacheEntry]) -> Result<(), Error> {
        self.write()?;
        let mut generations = self.generations.write().await;
        let target = find_or_create(&mut generations, generation);
        for entry in entries {
            target.upsert(entry.clone());
        }
        Ok(())
    }

    async fn match_any(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        self.read();
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .find_map(|g| g.entries.iter().find(|e| e.key == key))
            .cloned())
    }

    async fn entries(&self, generation: &str) -> Result<Vec<CacheEntry>, Error> {
        self.read();
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .find(|g| g.name == generation)
            .map(|g| g.entries.clone())
            .unwrap_or_default())
    }
}
