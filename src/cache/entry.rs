use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Cache key for a request: hex SHA-256 of the full URL string.
/// Doubles as the on-disk file stem, so it must stay filesystem-safe.
pub fn cache_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// A response captured into a cache store.
///
/// The body is held separately from the serialized metadata on disk; in
/// memory the two travel together.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub cached_at: DateTime<Utc>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(url: &str, status: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.to_string(),
            status,
            content_type,
            cached_at: Utc::now(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sidecar metadata persisted as `<key>.json` next to the raw body file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EntryMeta {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub cached_at: DateTime<Utc>,
}

impl From<&CachedResponse> for EntryMeta {
    fn from(response: &CachedResponse) -> Self {
        Self {
            url: response.url.clone(),
            status: response.status,
            content_type: response.content_type.clone(),
            cached_at: response.cached_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let a = cache_key("https://example.com/");
        let b = cache_key("https://example.com/");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_differs_by_url() {
        let a = cache_key("https://example.com/");
        let b = cache_key("https://example.com/about");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_format() {
        let key = cache_key("https://example.com/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_success_status_range() {
        let ok = CachedResponse::new("https://example.com/", 200, None, vec![]);
        assert!(ok.is_success());
        let missing = CachedResponse::new("https://example.com/gone", 404, None, vec![]);
        assert!(!missing.is_success());
    }
}
