// src/client.rs

//! HTTP client for the extension catalogue
//!
//! Translates typed requests into the wire protocol and typed results back.
//! The client is stateless: every call produces exactly one result and the
//! caller decides what to do with late or superseded answers.
//!
//! The sync controller talks to the catalogue through the [`CatalogTransport`]
//! trait so tests can substitute a scripted transport.

use crate::error::{Error, Result};
use crate::package::Package;
use crate::progress::{PercentTracker, ProgressSink};
use crate::protocol::{
    OperationResponse, ID_PARAM, INSTALL_PATH, KEYWORD_PARAM, SEARCH_PATH, UNINSTALL_PATH,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default timeout for HTTP requests (30 seconds)
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport used by the sync controller to reach a catalogue
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    /// Fetch the packages matching `keyword`
    async fn search(&self, keyword: &str, endpoint: &Url) -> Result<Vec<Package>>;

    /// Install a package, reporting progress while the response streams in
    ///
    /// Zero or more non-decreasing percentages are reported before the
    /// terminal result.
    async fn install(
        &self,
        package: &Package,
        endpoint: &Url,
        progress: &mut dyn ProgressSink,
    ) -> Result<()>;

    /// Uninstall a package
    async fn uninstall(&self, package: &Package, endpoint: &Url) -> Result<()>;
}

/// HTTP catalogue client
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
}

impl CatalogClient {
    /// Create a client with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(HTTP_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("extcat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Search the catalogue at `endpoint`
    pub async fn search(&self, keyword: &str, endpoint: &Url) -> Result<Vec<Package>> {
        let url = request_url(endpoint, SEARCH_PATH, KEYWORD_PARAM, keyword)?;
        debug!("Searching catalogue: {}", url);

        let response = self.send(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read search response: {e}")))?;

        let packages = parse_catalogue(&body)?;
        info!("Search '{}' returned {} package(s)", keyword, packages.len());
        Ok(packages)
    }

    /// Install `package`, streaming progress to `progress`
    ///
    /// When the server does not announce a body length, no intermediate
    /// progress is reported and the call completes directly.
    pub async fn install(
        &self,
        package: &Package,
        endpoint: &Url,
        progress: &mut dyn ProgressSink,
    ) -> Result<()> {
        let url = request_url(endpoint, INSTALL_PATH, ID_PARAM, &package.id)?;
        info!("Installing {} via {}", package.id, url);

        let mut response = self.send(url).await?;
        let mut tracker = PercentTracker::new(response.content_length());
        let mut body = Vec::new();

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Transport(format!("Install of {} interrupted: {e}", package.id)))?
        {
            body.extend_from_slice(&chunk);
            if let Some(percent) = tracker.advance(body.len() as u64) {
                progress.report(percent);
            }
        }

        check_operation(&body)
    }

    /// Uninstall `package`
    pub async fn uninstall(&self, package: &Package, endpoint: &Url) -> Result<()> {
        let url = request_url(endpoint, UNINSTALL_PATH, ID_PARAM, &package.id)?;
        info!("Uninstalling {} via {}", package.id, url);

        let response = self.send(url).await?;
        let body = response.bytes().await.map_err(|e| {
            Error::Transport(format!("Failed to read uninstall response for {}: {e}", package.id))
        })?;

        check_operation(&body)
    }

    /// Issue a GET and turn non-success statuses into `ServerRejected`
    async fn send(&self, url: Url) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("HTTP {} from {}", status, url);
            return Err(Error::ServerRejected {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CatalogTransport for CatalogClient {
    async fn search(&self, keyword: &str, endpoint: &Url) -> Result<Vec<Package>> {
        CatalogClient::search(self, keyword, endpoint).await
    }

    async fn install(
        &self,
        package: &Package,
        endpoint: &Url,
        progress: &mut dyn ProgressSink,
    ) -> Result<()> {
        CatalogClient::install(self, package, endpoint, progress).await
    }

    async fn uninstall(&self, package: &Package, endpoint: &Url) -> Result<()> {
        CatalogClient::uninstall(self, package, endpoint).await
    }
}

/// Build `<endpoint>/<path>?<key>=<value>`
///
/// The endpoint is treated as a directory, so `http://host/api` and
/// `http://host/api/` both resolve to `http://host/api/<path>`.
pub fn request_url(endpoint: &Url, path: &str, key: &str, value: &str) -> Result<Url> {
    if endpoint.cannot_be_a_base() {
        return Err(Error::InvalidEndpoint(endpoint.to_string()));
    }

    let mut base = endpoint.clone();
    base.set_query(None);
    base.set_fragment(None);
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }

    let mut url = base
        .join(path)
        .map_err(|e| Error::InvalidEndpoint(format!("{endpoint}: {e}")))?;
    url.query_pairs_mut().append_pair(key, value);
    Ok(url)
}

/// Parse a search response body
///
/// A body that is not a JSON array is a `ParseFailure`. Individual records
/// that lack required fields (or have an empty id) are dropped so that one
/// bad entry does not hide the rest of the catalogue.
pub fn parse_catalogue(body: &[u8]) -> Result<Vec<Package>> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| Error::ParseFailure(format!("Invalid JSON: {e}")))?;

    let serde_json::Value::Array(records) = value else {
        return Err(Error::ParseFailure("Expected a JSON array of packages".to_string()));
    };

    let total = records.len();
    let packages: Vec<Package> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Package>(record) {
            Ok(pkg) if !pkg.id.is_empty() => Some(pkg),
            Ok(_) => {
                warn!("Dropping catalogue entry {} with empty id", index);
                None
            }
            Err(e) => {
                warn!("Dropping malformed catalogue entry {}: {}", index, e);
                None
            }
        })
        .collect();

    if packages.len() < total {
        debug!("Kept {} of {} catalogue entries", packages.len(), total);
    }
    Ok(packages)
}

/// Validate an install/uninstall response body
fn check_operation(body: &[u8]) -> Result<()> {
    let response: OperationResponse = serde_json::from_slice(body)
        .map_err(|e| Error::ParseFailure(format!("Invalid operation response: {e}")))?;

    if response.is_ok() {
        Ok(())
    } else {
        Err(Error::ServerRejected {
            status: 200,
            message: format!("status '{}'", response.status),
        })
    }
}
