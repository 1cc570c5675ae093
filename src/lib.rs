// src/lib.rs

//! extcat - Extension catalogue synchronization
//!
//! Browse a remote catalogue of installable extensions, search it
//! interactively, and install or uninstall individual packages while a
//! local view of what is installed stays consistent with every outcome.
//!
//! # Architecture
//!
//! - Server: read-only in-memory catalogue behind a small HTTP/JSON protocol
//! - Client: typed requests over reqwest, progress reported while installs stream
//! - Registry: ordered, id-unique package store with installed/recommended views
//! - Sync controller: single-task owner of all state; debounced searches,
//!   generation-tagged responses, one in-flight operation per package

pub mod client;
pub mod config;
mod error;
pub mod package;
pub mod progress;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod sync;

pub use client::{CatalogClient, CatalogTransport};
pub use config::ExtcatConfig;
pub use error::{Error, Result};
pub use package::Package;
pub use progress::{LogProgress, PercentTracker, ProgressSink, SilentProgress};
pub use registry::ExtensionRegistry;
pub use server::{run_server, Catalog, ServerConfig};
pub use sync::{SyncConfig, SyncController, SyncEvent, SyncEvents, SyncHandle};
