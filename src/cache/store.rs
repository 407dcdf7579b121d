use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::entry::{cache_key, CachedResponse, EntryMeta};
use crate::error::AgentError;

/// One versioned cache store: a directory of `<key>.json` metadata files
/// with `<key>.body` raw bodies alongside.
///
/// Writes land body-first, so an entry only becomes visible once its
/// metadata file exists; a torn write reads as a miss. Overwriting the same
/// key is always safe, which is all the concurrency guarantee the fetch
/// path needs.
#[derive(Debug, Clone)]
pub struct CacheStore {
    name: String,
    dir: PathBuf,
}

impl CacheStore {
    pub(crate) fn open(root: &Path, name: &str) -> Result<Self, AgentError> {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            name: name.to_string(),
            dir,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.body", key))
    }

    /// Insert or overwrite the entry for the response's URL.
    pub fn put(&self, response: &CachedResponse) -> Result<(), AgentError> {
        let key = cache_key(&response.url);
        std::fs::write(self.body_path(&key), &response.body)?;
        let meta = EntryMeta::from(response);
        let contents = serde_json::to_string_pretty(&meta)?;
        std::fs::write(self.meta_path(&key), contents)?;
        debug!(store = %self.name, url = %response.url, bytes = response.body.len(), "cached response");
        Ok(())
    }

    /// Look up the entry for a URL. Absence is a normal miss, not an error;
    /// an unreadable entry is discarded and also reads as a miss.
    pub fn get(&self, url: &str) -> Result<Option<CachedResponse>, AgentError> {
        let key = cache_key(url);
        let meta_path = self.meta_path(&key);
        let contents = match std::fs::read_to_string(&meta_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta: EntryMeta = match serde_json::from_str(&contents) {
            Ok(meta) => meta,
            Err(error) => {
                warn!(store = %self.name, url, %error, "discarding unreadable cache entry");
                return Ok(None);
            }
        };
        let body = match std::fs::read(self.body_path(&key)) {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(store = %self.name, url, "cache entry has no body, treating as miss");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(CachedResponse {
            url: meta.url,
            status: meta.status,
            content_type: meta.content_type,
            cached_at: meta.cached_at,
            body,
        }))
    }

    pub fn contains(&self, url: &str) -> bool {
        self.meta_path(&cache_key(url)).exists()
    }

    /// Number of entries in the store.
    pub fn len(&self) -> usize {
        match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries
                .flatten()
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                .count(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
