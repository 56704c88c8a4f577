//! Named cache generations.
//!
//! A generation is a versioned store of request key to stored response.
//! The cache manager talks to generations only through [`CacheStorage`],
//! with two backends:
//!
//! - [`CacheDb`]: SQLite via tokio-rusqlite, WAL mode, schema migrations
//! - [`MemoryStorage`]: volatile, instrumented, used in tests

pub mod connection;
pub mod entry;
pub mod generations;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use entry::CacheEntry;
pub use memory::MemoryStorage;
pub use storage::CacheStorage;
