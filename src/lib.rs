//! sitecache - an offline caching agent for a small personal website.
//!
//! The agent keeps a versioned local cache of the site's essential
//! resources so they stay reachable offline. Its lifecycle mirrors the way
//! a browser manages a background worker: a registration installs the
//! current cache generation (precache of every essential path, plus the
//! versioned build assets the manifest names), activation deletes
//! superseded generations, and from then on every request is routed
//! through a cache-vs-network policy: network-first for pages,
//! cache-first for assets, same-origin-only writes, and a precached
//! offline page as the last resort for navigations.

pub mod agent;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod manifest;

pub use agent::{
    Agent, FetchError, FetchInterceptor, InstallState, PageRequest, ServedFrom, ServedResponse,
};
pub use cache::{CacheStore, CachedResponse, StorageReport, StoreManager};
pub use config::AgentConfig;
pub use error::AgentError;
pub use manifest::{Manifest, ManifestLoader};
