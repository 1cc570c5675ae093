// src/server/mod.rs
//! Extension catalogue server
//!
//! This module provides an HTTP server that:
//! - Answers keyword searches against an in-memory catalogue
//! - Simulates install/uninstall for known package ids
//! - Returns a plain 404 for anything else
//!
//! The server keeps no per-client state and its catalogue is read-only,
//! so the shared state needs no lock.

mod catalog;
mod handlers;
mod routes;

pub use catalog::Catalog;
pub use routes::create_router;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Default port the catalogue listens on
pub const DEFAULT_PORT: u16 = 8765;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,
    /// JSON catalogue to serve (None = bundled catalogue)
    pub catalogue_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            catalogue_path: None,
        }
    }
}

impl ServerConfig {
    /// Load the catalogue this configuration points at
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalogue_path {
            Some(path) => Catalog::from_file(path),
            None => Catalog::builtin(),
        }
    }
}

/// Shared server state
#[derive(Debug)]
pub struct ServerState {
    pub catalog: Catalog,
}

impl ServerState {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

/// Start the catalogue server
///
/// Failing to load the catalogue or bind the port is fatal.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let catalog = config.load_catalog()?;
    tracing::info!("Starting extension catalogue server on {}", config.bind_addr);
    match &config.catalogue_path {
        Some(path) => tracing::info!("Catalogue: {} ({} packages)", path.display(), catalog.len()),
        None => tracing::info!("Catalogue: bundled ({} packages)", catalog.len()),
    }

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    serve(listener, Arc::new(ServerState::new(catalog))).await
}

/// Serve requests on an already-bound listener until the task is dropped
pub async fn serve(listener: TcpListener, state: Arc<ServerState>) -> Result<()> {
    let local_addr = listener.local_addr()?;
    let app = create_router(state);

    tracing::info!("Catalogue is ready to serve on http://{}/", local_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
