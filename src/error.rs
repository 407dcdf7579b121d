use thiserror::Error;

/// Failure modes of the caching agent.
///
/// Absence of a cache entry is never an error: lookups return `Ok(None)`
/// and the routing policy decides what happens next.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("manifest request returned status {status}")]
    ManifestFetch { status: reqwest::StatusCode },

    #[error("manifest endpoint unreachable: {reason}")]
    ManifestUnavailable { reason: String },

    #[error("failed to precache {url}: {reason}")]
    Precache { url: String, reason: String },

    #[error("failed to cache versioned asset {url}: {reason}")]
    VersionedAsset { url: String, reason: String },

    #[error("storage unavailable: {0}")]
    Storage(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AgentError {
    /// True for failures that abort an install outright. Everything else is
    /// logged and degrades to a passthrough or no-response outcome.
    pub fn is_fatal_for_install(&self) -> bool {
        matches!(
            self,
            AgentError::Precache { .. } | AgentError::Storage(_) | AgentError::Config(_)
        )
    }
}
