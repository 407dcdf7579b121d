//! Agent configuration management.
//!
//! The configuration carries everything the lifecycle handlers need: the
//! site origin, the cache version tag, the precache list, and the manifest
//! settings. Handlers read the version tag from here; it is never a
//! free-floating global.
//!
//! Configuration is stored at `~/.config/sitecache/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "sitecache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Origin of the controlled site, scheme + host + port.
    pub origin: String,
    /// Tag naming the current cache generation. Bump it to retire every
    /// previously populated store on the next activation.
    pub cache_version: String,
    /// Absolute paths cached unconditionally during install.
    pub precache: Vec<String>,
    /// Page served when a navigation misses both network and cache.
    /// Must appear in `precache` to be of any use offline.
    pub offline_path: String,
    /// Path of the build manifest, relative to the origin.
    pub manifest_path: String,
    /// Username for the manifest's basic-auth challenge.
    pub manifest_username: String,
    /// Logical asset names resolved through the manifest during install.
    pub manifest_assets: Vec<String>,
    /// Overrides the platform cache directory; mainly for tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_root: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            origin: "https://example.com".to_string(),
            cache_version: "v1".to_string(),
            precache: default_precache(),
            offline_path: "/offline".to_string(),
            manifest_path: "/mix-manifest.json".to_string(),
            manifest_username: "deploy".to_string(),
            manifest_assets: vec!["/css/app.css".to_string(), "/js/app.js".to_string()],
            cache_root: None,
        }
    }
}

/// The essentials of a small personal site: every page, the web fonts in
/// each served format, the brand images, and the CV document.
fn default_precache() -> Vec<String> {
    [
        // pages
        "/",
        "/projects",
        "/about",
        "/contact",
        "/cv",
        "/offline",
        // fonts
        "/fonts/sans/sans-regular.woff2",
        "/fonts/sans/sans-bold.woff2",
        "/fonts/serif/serif-regular.woff2",
        "/fonts/sans/sans-regular.woff",
        "/fonts/sans/sans-bold.woff",
        "/fonts/serif/serif-regular.woff",
        "/fonts/sans/sans-regular.ttf",
        "/fonts/sans/sans-bold.ttf",
        "/fonts/serif/serif-regular.ttf",
        // images
        "/images/brand/logo-1x.png",
        "/images/brand/logo-2x.png",
        // documents
        "/documents/cv.pdf",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

impl AgentConfig {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Root directory under which one subdirectory per cache version lives.
    pub fn cache_root(&self) -> Result<PathBuf> {
        if let Some(ref root) = self.cache_root {
            return Ok(root.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_precache_includes_offline_page() {
        let config = AgentConfig::default();
        assert!(config.precache.contains(&config.offline_path));
    }

    #[test]
    fn test_default_precache_starts_with_root_page() {
        let config = AgentConfig::default();
        assert_eq!(config.precache.first().map(String::as_str), Some("/"));
    }

    #[test]
    fn test_explicit_cache_root_wins() {
        let config = AgentConfig {
            cache_root: Some(PathBuf::from("/tmp/sitecache-test")),
            ..AgentConfig::default()
        };
        assert_eq!(
            config.cache_root().unwrap(),
            PathBuf::from("/tmp/sitecache-test")
        );
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = AgentConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AgentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.origin, config.origin);
        assert_eq!(back.cache_version, config.cache_version);
        assert_eq!(back.precache, config.precache);
    }
}
