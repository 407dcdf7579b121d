use std::path::PathBuf;

use futures::future::join_all;
use tracing::{info, warn};

use super::store::CacheStore;
use crate::error::AgentError;

/// Owns the cache root and the current version tag.
///
/// Exactly one store is current at any time. All others are stale and
/// eligible for deletion once the current one is confirmed populated;
/// `delete_stale` is the only reclamation point.
#[derive(Debug, Clone)]
pub struct StoreManager {
    root: PathBuf,
    current: String,
}

impl StoreManager {
    pub fn new(root: PathBuf, current_tag: &str) -> Result<Self, AgentError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            current: current_tag.to_string(),
        })
    }

    pub fn current_tag(&self) -> &str {
        &self.current
    }

    /// Open the store named by the current version tag, creating it if
    /// absent. Idempotent.
    pub fn open_current(&self) -> Result<CacheStore, AgentError> {
        CacheStore::open(&self.root, &self.current)
    }

    /// Names of every existing store, current or not.
    pub fn list_all(&self) -> Result<Vec<String>, AgentError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete every store whose name differs from the current tag.
    ///
    /// Deletions are independent: a failure is logged and recorded, never
    /// allowed to block the others. Returns the names actually deleted once
    /// every attempt has settled.
    pub async fn delete_stale(&self) -> Result<Vec<String>, AgentError> {
        let stale: Vec<String> = self
            .list_all()?
            .into_iter()
            .filter(|name| *name != self.current)
            .collect();

        let deletions = stale.into_iter().map(|name| {
            let path = self.root.join(&name);
            async move {
                let removal =
                    tokio::task::spawn_blocking(move || std::fs::remove_dir_all(path)).await;
                match removal {
                    Ok(Ok(())) => {
                        info!(store = %name, "deleted stale cache store");
                        Some(name)
                    }
                    Ok(Err(error)) => {
                        warn!(store = %name, %error, "failed to delete stale cache store");
                        None
                    }
                    Err(error) => {
                        warn!(store = %name, %error, "stale store deletion task failed");
                        None
                    }
                }
            }
        });

        Ok(join_all(deletions).await.into_iter().flatten().collect())
    }

    /// Informational storage diagnostic: entry counts and used bytes per
    /// store. Has no effect on caching decisions.
    pub fn storage_report(&self) -> Result<StorageReport, AgentError> {
        let mut stores = Vec::new();
        for name in self.list_all()? {
            let dir = self.root.join(&name);
            let mut entries = 0;
            let mut bytes = 0;
            for file in std::fs::read_dir(&dir)?.flatten() {
                if let Ok(meta) = file.metadata() {
                    bytes += meta.len();
                }
                if file.path().extension().is_some_and(|ext| ext == "json") {
                    entries += 1;
                }
            }
            stores.push(StoreUsage {
                current: name == self.current,
                name,
                entries,
                bytes,
            });
        }
        Ok(StorageReport { stores })
    }
}

#[derive(Debug, Clone)]
pub struct StoreUsage {
    pub name: String,
    pub entries: usize,
    pub bytes: u64,
    pub current: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StorageReport {
    pub stores: Vec<StoreUsage>,
}

impl StorageReport {
    pub fn total_bytes(&self) -> u64 {
        self.stores.iter().map(|s| s.bytes).sum()
    }
}
