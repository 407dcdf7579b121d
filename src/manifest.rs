//! Build manifest loading.
//!
//! The site's build pipeline publishes `mix-manifest.json`, a JSON object
//! mapping logical asset paths to their current versioned URLs
//! (`"/css/app.css"` → `"/css/app.css?id=abc123"`). The loader fetches it
//! once per agent lifetime, behind basic auth, and hands back a read-only
//! lookup.
//!
//! Every load settles: a non-200 response and a transport failure are both
//! deterministic errors, and the whole fetch runs under a deadline so no
//! caller can hang on a silent network.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::auth::ManifestCredentials;
use crate::error::AgentError;

/// Deadline for the manifest fetch in seconds.
/// The manifest is a tiny JSON file; anything slower than this means the
/// network is effectively down and install should move on without it.
const MANIFEST_TIMEOUT_SECS: u64 = 10;

/// Read-only mapping of logical asset path to versioned URL.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

impl Manifest {
    pub fn resolve(&self, logical: &str) -> Option<&str> {
        self.entries.get(logical).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

pub struct ManifestLoader {
    client: Client,
    url: Url,
    credentials: ManifestCredentials,
}

impl ManifestLoader {
    pub fn new(client: Client, url: Url, credentials: ManifestCredentials) -> Self {
        Self {
            client,
            url,
            credentials,
        }
    }

    /// Fetch and parse the manifest.
    ///
    /// Status 200 is the only success. Any other status maps to
    /// `ManifestFetch`; a transport error or an expired deadline maps to
    /// `ManifestUnavailable`.
    pub async fn load(&self) -> Result<Manifest, AgentError> {
        let request = self
            .client
            .get(self.url.clone())
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send();

        let response = match tokio::time::timeout(
            Duration::from_secs(MANIFEST_TIMEOUT_SECS),
            request,
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                return Err(AgentError::ManifestUnavailable {
                    reason: error.to_string(),
                })
            }
            Err(_) => {
                return Err(AgentError::ManifestUnavailable {
                    reason: format!("no response within {}s", MANIFEST_TIMEOUT_SECS),
                })
            }
        };

        if response.status() != StatusCode::OK {
            return Err(AgentError::ManifestFetch {
                status: response.status(),
            });
        }

        let text = response.text().await?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&text)?;
        debug!(assets = entries.len(), url = %self.url, "manifest loaded");
        Ok(Manifest { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown_keys() {
        let manifest: Manifest = [
            (
                "/css/app.css".to_string(),
                "/css/app.css?id=abc123".to_string(),
            ),
            ("/js/app.js".to_string(), "/js/app.js?id=def456".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(manifest.resolve("/css/app.css"), Some("/css/app.css?id=abc123"));
        assert_eq!(manifest.resolve("/css/other.css"), None);
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::default();
        assert!(manifest.is_empty());
        assert_eq!(manifest.resolve("/js/app.js"), None);
    }
}
