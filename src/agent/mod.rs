//! Agent lifecycle: install, activate, intercept.
//!
//! Registration runs install then activate, in that order, and activation
//! never runs when install fails. Once registered, the interceptor handles
//! requests for the lifetime of the agent instance. The version tag comes
//! from the configuration handed to [`Agent::new`]; lifecycle handlers
//! read it from there.

mod activate;
mod install;
pub mod fetch;

use std::time::Duration;

use reqwest::Client;
use url::Url;

pub use fetch::{FetchError, FetchInterceptor, PageRequest, ServedFrom, ServedResponse};

use crate::cache::StoreManager;
use crate::config::AgentConfig;
use crate::error::AgentError;

/// HTTP request timeout in seconds.
/// Short enough that the offline fallback feels immediate when the network
/// is down, long enough for a slow shared host to answer.
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Install progress for the current agent instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Idle,
    Populating,
    Populated,
    Failed,
}

pub struct Agent {
    config: AgentConfig,
    origin: Url,
    client: Client,
    stores: StoreManager,
    install_state: InstallState,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        let origin = Url::parse(&config.origin).map_err(|e| {
            AgentError::Config(format!("invalid origin {}: {}", config.origin, e))
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let root = config
            .cache_root()
            .map_err(|e| AgentError::Config(e.to_string()))?;
        let stores = StoreManager::new(root, &config.cache_version)?;
        Ok(Self {
            config,
            origin,
            client,
            stores,
            install_state: InstallState::Idle,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn stores(&self) -> &StoreManager {
        &self.stores
    }

    pub fn install_state(&self) -> InstallState {
        self.install_state
    }

    /// Register the agent: install, then activate.
    ///
    /// A precache failure aborts the whole registration and leaves any
    /// stale generations untouched.
    pub async fn register(&mut self) -> Result<(), AgentError> {
        self.run_install().await?;
        self.run_activate().await?;
        Ok(())
    }

    /// Interceptor over the current store.
    ///
    /// Ordering is the host's guarantee, not ours: requests should only be
    /// routed here after a registration has populated and activated the
    /// current generation. On a never-registered cache every lookup is
    /// simply a miss.
    pub fn interceptor(&self) -> Result<FetchInterceptor, AgentError> {
        let store = self.stores.open_current()?;
        let offline_url = self.origin.join(&self.config.offline_path).map_err(|e| {
            AgentError::Config(format!(
                "invalid offline path {}: {}",
                self.config.offline_path, e
            ))
        })?;
        Ok(FetchInterceptor::new(
            self.client.clone(),
            store,
            self.origin.clone(),
            offline_url,
        ))
    }
}
