//! Versioned cache stores for offline access.
//!
//! A store is a named request→response mapping on disk, one directory per
//! cache version under the cache root. The `StoreManager` owns the set of
//! stores and treats exactly one, named by the current version tag, as
//! authoritative; everything else is a stale generation awaiting deletion.

pub mod entry;
pub mod manager;
pub mod store;

pub use entry::{cache_key, CachedResponse};
pub use manager::{StorageReport, StoreManager, StoreUsage};
pub use store::CacheStore;
