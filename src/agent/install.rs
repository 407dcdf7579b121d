use reqwest::header;
use tracing::{info, warn};
use url::Url;

use super::{Agent, InstallState};
use crate::auth::ManifestCredentials;
use crate::cache::{CacheStore, CachedResponse};
use crate::error::AgentError;
use crate::manifest::ManifestLoader;

impl Agent {
    /// Install: populate the current store.
    ///
    /// The precache pass is all-or-nothing for reporting: one failed entry
    /// fails the install, though entries written before the failure stay in
    /// the store (no rollback). The manifest pass afterwards is best-effort
    /// and can never fail an install that precached cleanly.
    pub(crate) async fn run_install(&mut self) -> Result<(), AgentError> {
        self.install_state = InstallState::Populating;
        info!(version = %self.stores.current_tag(), "installing cache agent");

        let store = match self.stores.open_current() {
            Ok(store) => store,
            Err(error) => {
                self.install_state = InstallState::Failed;
                return Err(error);
            }
        };

        match self.precache(&store).await {
            Ok(count) => info!(entries = count, "precache complete"),
            Err(error) => {
                self.install_state = InstallState::Failed;
                return Err(error);
            }
        }

        // Versioned build assets ride along only when the manifest
        // cooperates.
        if let Err(error) = self.cache_versioned_assets(&store).await {
            warn!(%error, "skipping versioned asset precache");
        }

        self.install_state = InstallState::Populated;
        Ok(())
    }

    async fn precache(&self, store: &CacheStore) -> Result<usize, AgentError> {
        if !self.config.precache.contains(&self.config.offline_path) {
            warn!(
                path = %self.config.offline_path,
                "offline fallback page is not in the precache list"
            );
        }
        let mut added = 0;
        for path in &self.config.precache {
            let url = self.origin.join(path).map_err(|e| AgentError::Precache {
                url: path.clone(),
                reason: e.to_string(),
            })?;
            self.fetch_into_store(store, &url)
                .await
                .map_err(|reason| AgentError::Precache {
                    url: url.to_string(),
                    reason,
                })?;
            added += 1;
        }
        Ok(added)
    }

    /// Resolve the configured logical assets through the manifest and cache
    /// them into the same store the precache pass used.
    ///
    /// Entries written for earlier manifest revisions are not evicted here;
    /// they linger until the version tag changes and activation reclaims
    /// the whole generation.
    async fn cache_versioned_assets(&self, store: &CacheStore) -> Result<(), AgentError> {
        let credentials = ManifestCredentials::resolve(&self.config.manifest_username)
            .map_err(|e| AgentError::ManifestUnavailable {
                reason: e.to_string(),
            })?;
        let manifest_url =
            self.origin
                .join(&self.config.manifest_path)
                .map_err(|e| AgentError::Config(format!(
                    "invalid manifest path {}: {}",
                    self.config.manifest_path, e
                )))?;
        let loader = ManifestLoader::new(self.client.clone(), manifest_url, credentials);
        let manifest = loader.load().await?;

        for logical in &self.config.manifest_assets {
            let Some(versioned) = manifest.resolve(logical) else {
                warn!(asset = %logical, "manifest has no entry for asset");
                continue;
            };
            let url = self
                .origin
                .join(versioned)
                .map_err(|e| AgentError::VersionedAsset {
                    url: versioned.to_string(),
                    reason: e.to_string(),
                })?;
            self.fetch_into_store(store, &url)
                .await
                .map_err(|reason| AgentError::VersionedAsset {
                    url: url.to_string(),
                    reason,
                })?;
        }
        Ok(())
    }

    /// Fetch one URL and write it into the store. A non-success status is a
    /// failure here: a 404 must not become a precached page.
    async fn fetch_into_store(&self, store: &CacheStore, url: &Url) -> Result<(), String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("status {}", status));
        }
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| e.to_string())?;
        store
            .put(&CachedResponse::new(
                url.as_str(),
                status.as_u16(),
                content_type,
                body.to_vec(),
            ))
            .map_err(|e| e.to_string())
    }
}
