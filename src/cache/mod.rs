//! Cache module for memoizing API responses in memory
//!
//! This module provides an in-process cache manager with a per-entry TTL
//! (time-to-live) and a key builder that renders query parameters in a
//! canonical order, so logically identical requests share one entry.

mod key;
mod manager;

pub use key::CacheKey;
pub use manager::{CacheManager, CacheStats, CachedData};
