//! Cache inspection tools.
//!
//! Read-only views of the generations the cache manager keeps.

pub mod get;
pub mod list;

pub use get::{CacheGetParams, get_impl};
pub use list::list_impl;
