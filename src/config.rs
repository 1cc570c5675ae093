// src/config.rs
//! Configuration file parsing
//!
//! Supports TOML configuration files with the following sections:
//! - [server] - Bind address and catalogue file
//! - [client] - Catalogue endpoint, debounce, timeouts
//!
//! Every key is optional. A missing file section falls back to defaults.

use crate::server::{ServerConfig, DEFAULT_PORT};
use crate::sync::SyncConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
pub struct ExtcatConfig {
    /// Server settings
    #[serde(default)]
    pub server: ServerSection,

    /// Client settings
    #[serde(default)]
    pub client: ClientSection,
}

/// Server configuration section
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// JSON catalogue file (bundled catalogue when unset)
    #[serde(default)]
    pub catalogue: Option<PathBuf>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            catalogue: None,
        }
    }
}

fn default_bind() -> String {
    format!("127.0.0.1:{DEFAULT_PORT}")
}

/// Client configuration section
#[derive(Debug, Deserialize)]
pub struct ClientSection {
    /// Catalogue server base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Search debounce in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fetch the full catalogue when a session starts
    #[serde(default = "default_true")]
    pub initial_load: bool,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            debounce_ms: default_debounce_ms(),
            timeout_secs: default_timeout_secs(),
            initial_load: true,
        }
    }
}

fn default_endpoint() -> String {
    format!("http://127.0.0.1:{DEFAULT_PORT}/")
}

fn default_debounce_ms() -> u64 {
    350
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl ExtcatConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML configuration")
    }

    /// Build the server configuration
    pub fn server_config(&self) -> Result<ServerConfig> {
        let bind_addr: SocketAddr = self
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.server.bind))?;

        Ok(ServerConfig {
            bind_addr,
            catalogue_path: self.server.catalogue.clone(),
        })
    }

    /// Catalogue endpoint as a URL
    pub fn endpoint(&self) -> Result<Url> {
        Url::parse(&self.client.endpoint)
            .with_context(|| format!("Invalid catalogue endpoint: {}", self.client.endpoint))
    }

    /// HTTP request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.client.timeout_secs)
    }

    /// Build the sync controller configuration
    pub fn sync_config(&self) -> Result<SyncConfig> {
        Ok(SyncConfig::new(self.endpoint()?)
            .with_debounce(Duration::from_millis(self.client.debounce_ms))
            .with_initial_load(self.client.initial_load))
    }
}
