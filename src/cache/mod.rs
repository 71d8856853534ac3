//! # Resource Cache Module
//!
//! In-memory TTL cache for response envelopes, shared by every in-flight request.
//!
//! ## Overview
//!
//! - **Keys**: SHA-256 digest of the URI path plus the sorted query parameters,
//!   excluding the `no-cache` bypass flag (see [`generate_key`])
//! - **Expiry**: every entry carries an absolute expiry instant; `get` treats
//!   expired entries as misses
//! - **Sweep**: a background thread removes expired entries on a fixed interval and
//!   is stopped deterministically by [`ResourceCache::stop`] (or on drop)
//! - **Capacity**: when full, the entry with the soonest expiry is evicted before a
//!   new key is inserted. This approximates LRU by remaining TTL, not by access
//!   recency.
//!
//! ## Thread Safety
//!
//! The store sits behind a `parking_lot::RwLock`:
//! - `get` takes a shared lock, so concurrent readers never block each other
//! - `set`, `delete`, `clear` and the sweep take the exclusive lock
//!
//! ## Example
//!
//! ```rust
//! use resource_gateway::cache::{CacheConfig, ResourceCache};
//! use std::time::Duration;
//!
//! let cache: ResourceCache<String> = ResourceCache::new(CacheConfig::default());
//! cache.set("k", "v".to_string(), Duration::from_secs(30));
//! assert_eq!(cache.get("k").as_deref(), Some("v"));
//! cache.stop();
//! ```

mod core;
mod headers;
mod key;

pub use core::{CacheConfig, CacheEntry, CacheOptions, CacheStats, ResourceCache};
pub use headers::CacheOutcome;
pub use key::{generate_key, NO_CACHE_PARAM};
