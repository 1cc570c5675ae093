// src/sync/mod.rs
//! Catalogue synchronization
//!
//! The [`SyncController`] is the only stateful orchestrator between the
//! presentation layer and the catalogue. It owns the registry, the debounce
//! timer, the search generation counter and the set of in-flight operations.
//!
//! Presentation code talks to it through a [`SyncHandle`] and listens to the
//! [`SyncEvent`] stream; it never touches the registry directly.
//!
//! # Example
//!
//! ```ignore
//! use extcat::client::CatalogClient;
//! use extcat::sync::{SyncConfig, SyncController, SyncEvent};
//!
//! let client = Arc::new(CatalogClient::new()?);
//! let (handle, mut events, _task) = SyncController::spawn(client, SyncConfig::new(endpoint));
//!
//! handle.request_search("mesh")?;
//! while let Some(event) = events.recv().await {
//!     if let SyncEvent::RegistryChanged { installed, recommended } = event {
//!         println!("{} installed, {} available", installed.len(), recommended.len());
//!     }
//! }
//! ```

mod controller;
mod pending;

pub use controller::SyncController;
pub use pending::{OperationKind, PendingOperation, PendingOperations};

use crate::error::{Error, Result};
use crate::package::Package;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// Quiet period after the last keystroke before a search is fired
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);

/// Sync controller configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the catalogue server
    pub endpoint: Url,
    /// Debounce interval for search requests
    pub debounce: Duration,
    /// Fetch the whole catalogue as soon as the controller starts
    pub initial_load: bool,
}

impl SyncConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            debounce: DEFAULT_DEBOUNCE,
            initial_load: true,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_initial_load(mut self, initial_load: bool) -> Self {
        self.initial_load = initial_load;
        self
    }
}

/// Events published by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Registry contents changed; both views come from the same snapshot
    RegistryChanged {
        installed: Vec<Package>,
        recommended: Vec<Package>,
    },
    /// One-line status for the user
    StatusMessage { text: String, is_error: bool },
    /// Install progress for a package (0-100, non-decreasing per install)
    InstallProgress { id: String, percent: u8 },
}

/// Receiving end of the controller's event stream
pub type SyncEvents = mpsc::UnboundedReceiver<SyncEvent>;

/// User intents accepted by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Search(String),
    Install(String),
    Uninstall(String),
}

/// Cloneable entry point for presentation code
///
/// Dropping every handle stops the controller.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl SyncHandle {
    pub(crate) fn new(commands: mpsc::UnboundedSender<Command>) -> Self {
        Self { commands }
    }

    /// Report the current search text; the search fires once typing pauses
    pub fn request_search(&self, keyword: impl Into<String>) -> Result<()> {
        self.send(Command::Search(keyword.into()))
    }

    /// Ask for a package to be installed (no-op if installed or busy)
    pub fn request_install(&self, id: impl Into<String>) -> Result<()> {
        self.send(Command::Install(id.into()))
    }

    /// Ask for a package to be uninstalled (no-op if not installed or busy)
    pub fn request_uninstall(&self, id: impl Into<String>) -> Result<()> {
        self.send(Command::Uninstall(id.into()))
    }

    /// Whether the controller is still accepting requests
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| Error::ControllerStopped)
    }
}
