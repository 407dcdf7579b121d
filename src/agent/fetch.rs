//! Request interception and routing.
//!
//! Every request the controlled site issues goes through
//! [`FetchInterceptor::intercept`], which picks cache-vs-network precedence
//! by content negotiation:
//!
//! - Navigations (`Accept` contains `text/html`) go network-first, so
//!   markup is fresh whenever the network is up. On failure the cache is
//!   consulted, then the precached offline page.
//! - Everything else goes cache-first: assets are keyed to immutable
//!   versioned URLs, so a hit never needs revalidation.
//!
//! Successful same-origin responses are written back into the current
//! store on the way out. Cross-origin responses pass through untouched;
//! caching them would grow the store without bound and could capture
//! opaque third-party bodies. Writes complete before the response is
//! returned, trading a little latency for a durable entry.

use reqwest::{header, Client};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::cache::{CacheStore, CachedResponse};

const HTML_ACCEPT: &str = "text/html";

/// Interception outcome that produced no response. Non-fatal by contract:
/// the driver logs it and the requester sees a failed load, nothing more.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("offline with no cached copy or fallback page for {url}")]
    OfflineUnavailable { url: String },
}

/// A request pending interception. Transient; nothing here outlives the
/// routing decision.
#[derive(Debug, Clone)]
pub struct PageRequest {
    url: Url,
    accept: Option<String>,
}

impl PageRequest {
    pub fn new(url: Url) -> Self {
        Self { url, accept: None }
    }

    /// A navigation-style request, as a browser address bar would issue.
    pub fn navigation(url: Url) -> Self {
        Self::new(url).with_accept("text/html,application/xhtml+xml")
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    /// Declared content negotiation decides the routing branch, not the
    /// URL shape.
    pub fn is_navigation(&self) -> bool {
        self.accept
            .as_deref()
            .is_some_and(|accept| accept.contains(HTML_ACCEPT))
    }
}

/// How a served response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Network,
    Cache,
    OfflineFallback,
}

#[derive(Debug, Clone)]
pub struct ServedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub served_from: ServedFrom,
}

/// A fully buffered network response, before the write-back decision.
struct NetworkResponse {
    url: String,
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl NetworkResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn into_served(self) -> ServedResponse {
        ServedResponse {
            status: self.status,
            content_type: self.content_type,
            body: self.body,
            served_from: ServedFrom::Network,
        }
    }
}

fn served_from_cache(cached: CachedResponse, served_from: ServedFrom) -> ServedResponse {
    ServedResponse {
        status: cached.status,
        content_type: cached.content_type,
        body: cached.body,
        served_from,
    }
}

pub(crate) fn same_origin(url: &Url, origin: &Url) -> bool {
    url.origin() == origin.origin()
}

/// Routes requests between the network and the current cache store.
/// Clone is cheap: the reqwest client shares its pool and the store is a
/// name plus a path.
#[derive(Clone)]
pub struct FetchInterceptor {
    client: Client,
    store: CacheStore,
    origin: Url,
    offline_url: Url,
}

impl FetchInterceptor {
    pub(crate) fn new(client: Client, store: CacheStore, origin: Url, offline_url: Url) -> Self {
        Self {
            client,
            store,
            origin,
            offline_url,
        }
    }

    pub async fn intercept(&self, request: &PageRequest) -> Result<ServedResponse, FetchError> {
        if request.is_navigation() {
            self.serve_navigation(request).await
        } else {
            self.serve_asset(request).await
        }
    }

    /// Network-first. The cache only speaks when the network cannot.
    async fn serve_navigation(&self, request: &PageRequest) -> Result<ServedResponse, FetchError> {
        match self.fetch_network(request).await {
            Ok(response) => {
                if same_origin(request.url(), &self.origin) {
                    self.write_back(&response);
                }
                Ok(response.into_served())
            }
            Err(error) => {
                debug!(url = %request.url(), %error, "network unavailable, consulting cache");
                if let Some(cached) = self.lookup(request.url()) {
                    return Ok(served_from_cache(cached, ServedFrom::Cache));
                }
                if let Some(offline) = self.lookup(&self.offline_url) {
                    return Ok(served_from_cache(offline, ServedFrom::OfflineFallback));
                }
                Err(FetchError::OfflineUnavailable {
                    url: request.url().to_string(),
                })
            }
        }
    }

    /// Cache-first. A hit never touches the network.
    async fn serve_asset(&self, request: &PageRequest) -> Result<ServedResponse, FetchError> {
        if let Some(cached) = self.lookup(request.url()) {
            return Ok(served_from_cache(cached, ServedFrom::Cache));
        }
        let response = self.fetch_network(request).await?;
        if same_origin(request.url(), &self.origin) {
            self.write_back(&response);
        }
        Ok(response.into_served())
    }

    async fn fetch_network(&self, request: &PageRequest) -> Result<NetworkResponse, reqwest::Error> {
        let mut builder = self.client.get(request.url().clone());
        if let Some(accept) = request.accept() {
            builder = builder.header(header::ACCEPT, accept);
        }
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();
        Ok(NetworkResponse {
            url: request.url().to_string(),
            status,
            content_type,
            body,
        })
    }

    /// Opportunistic write-back of a successful response. The body is
    /// cloned so the original stays servable; a storage failure is logged
    /// and the response passes through regardless.
    fn write_back(&self, response: &NetworkResponse) {
        if !response.is_success() {
            return;
        }
        let entry = CachedResponse::new(
            &response.url,
            response.status,
            response.content_type.clone(),
            response.body.clone(),
        );
        if let Err(error) = self.store.put(&entry) {
            warn!(url = %response.url, %error, "cache write failed, serving response anyway");
        }
    }

    /// Lookup with the store's errors downgraded to a miss. A broken cache
    /// must never break a request that the network could still serve.
    fn lookup(&self, url: &Url) -> Option<CachedResponse> {
        match self.store.get(url.as_str()) {
            Ok(hit) => hit,
            Err(error) => {
                warn!(url = %url, %error, "cache lookup failed");
                None
            }
        }
    }
}
