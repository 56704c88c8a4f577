//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Request/response model and request classification
//! - Cache generation storage (SQLite and in-memory)
//! - Unified error types
//! - Configuration loading

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod request;

pub use cache::{CacheDb, CacheEntry, CacheStorage, MemoryStorage};
pub use classify::{CacheRules, Classification, Strategy, classify};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use request::{Headers, InterceptedRequest, RequestMode, Response};
