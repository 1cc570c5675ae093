// src/sync/controller.rs
//! Sync controller event loop
//!
//! All state lives on one task. Network calls run on spawned tasks and
//! report back through a completion channel, so every mutation of the
//! registry and the pending set happens inside the loop.
//!
//! Search state machine:
//! - each request resets the debounce deadline; only expiry fires a search
//! - each fired search gets the next generation number
//! - a response is applied only if its generation is still the latest fired
//!
//! Package state machine (per id):
//!
//! ```text
//! NotInstalled --install--> Installing(p) --ok--> Installed
//! Installing(p) --err--> NotInstalled
//! Installed --uninstall--> Uninstalling --ok--> NotInstalled
//! Uninstalling --err--> Installed
//! ```

use super::pending::{OperationKind, PendingOperations};
use super::{Command, SyncConfig, SyncEvent, SyncEvents, SyncHandle};
use crate::client::CatalogTransport;
use crate::error::{Error, Result};
use crate::package::Package;
use crate::registry::ExtensionRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Results of network work, marshalled back onto the controller task
#[derive(Debug)]
enum Completion {
    Search {
        generation: u64,
        keyword: String,
        result: Result<Vec<Package>>,
    },
    Progress {
        id: String,
        percent: u8,
    },
    Operation {
        id: String,
        name: String,
        kind: OperationKind,
        result: Result<()>,
    },
}

/// Owner of the registry and driver of all catalogue traffic
pub struct SyncController<T> {
    state: ControllerState<T>,
    commands: mpsc::UnboundedReceiver<Command>,
    completions: mpsc::UnboundedReceiver<Completion>,
}

struct ControllerState<T> {
    transport: Arc<T>,
    config: SyncConfig,
    registry: ExtensionRegistry,
    pending: PendingOperations,
    /// Successful outcomes tagged with the generation that was latest when
    /// they completed; a search fired no later than that may predate them
    confirmed: HashMap<String, (bool, u64)>,
    /// Generation of the most recently fired search
    generation: u64,
    /// Debounce deadline and the keyword it will fire with
    debounce: Option<(Instant, String)>,
    events: mpsc::UnboundedSender<SyncEvent>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl<T: CatalogTransport + 'static> SyncController<T> {
    /// Create a controller together with its handle and event stream
    ///
    /// Nothing happens until [`run`](Self::run) is awaited.
    pub fn new(transport: Arc<T>, config: SyncConfig) -> (Self, SyncHandle, SyncEvents) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let controller = Self {
            state: ControllerState {
                transport,
                config,
                registry: ExtensionRegistry::new(),
                pending: PendingOperations::new(),
                confirmed: HashMap::new(),
                generation: 0,
                debounce: None,
                events: event_tx,
                completions: completion_tx,
            },
            commands: command_rx,
            completions: completion_rx,
        };

        (controller, SyncHandle::new(command_tx), event_rx)
    }

    /// Create a controller and run it on a new task
    pub fn spawn(transport: Arc<T>, config: SyncConfig) -> (SyncHandle, SyncEvents, JoinHandle<()>) {
        let (controller, handle, events) = Self::new(transport, config);
        let task = tokio::spawn(controller.run());
        (handle, events, task)
    }

    /// Process requests and completions until every handle is dropped
    pub async fn run(self) {
        let SyncController {
            mut state,
            mut commands,
            mut completions,
        } = self;

        if state.config.initial_load {
            state.fire_search(String::new());
        }

        loop {
            let deadline = state.debounce.as_ref().map(|(at, _)| *at);

            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => state.handle_command(command),
                    None => break,
                },
                Some(completion) = completions.recv() => state.handle_completion(completion),
                _ = debounce_elapsed(deadline) => state.fire_pending_search(),
            }
        }

        debug!(
            "Sync controller stopped ({} operation(s) still in flight)",
            state.pending.len()
        );
    }
}

/// Resolves at the deadline, or never when no search is waiting
async fn debounce_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl<T: CatalogTransport + 'static> ControllerState<T> {
    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Search(keyword) => {
                let deadline = Instant::now() + self.config.debounce;
                self.debounce = Some((deadline, keyword));
            }
            Command::Install(id) => self.start_operation(id, OperationKind::Install),
            Command::Uninstall(id) => self.start_operation(id, OperationKind::Uninstall),
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Search {
                generation,
                keyword,
                result,
            } => self.apply_search(generation, &keyword, result),
            Completion::Progress { id, percent } => {
                if let Some(percent) = self.pending.update_progress(&id, percent) {
                    self.emit(SyncEvent::InstallProgress { id, percent });
                }
            }
            Completion::Operation {
                id,
                name,
                kind,
                result,
            } => self.finish_operation(id, &name, kind, result),
        }
    }

    fn fire_pending_search(&mut self) {
        if let Some((_, keyword)) = self.debounce.take() {
            self.fire_search(keyword);
        }
    }

    fn fire_search(&mut self, keyword: String) {
        self.generation += 1;
        let generation = self.generation;
        let keyword = keyword.trim().to_string();
        debug!("Firing search '{}' (generation {})", keyword, generation);
        self.status("Searching…", false);

        let transport = Arc::clone(&self.transport);
        let endpoint = self.config.endpoint.clone();
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = transport.search(&keyword, &endpoint).await;
            let _ = completions.send(Completion::Search {
                generation,
                keyword,
                result,
            });
        });
    }

    fn apply_search(&mut self, generation: u64, keyword: &str, result: Result<Vec<Package>>) {
        if generation != self.generation {
            debug!(
                "Discarding stale search '{}' (generation {}, latest {})",
                keyword, generation, self.generation
            );
            return;
        }

        match result {
            Ok(packages) => {
                let count = self.replace_registry(generation, packages);
                if count == 0 {
                    self.status("No extensions found.", false);
                } else {
                    let plural = if count == 1 { "" } else { "s" };
                    self.status(&format!("Showing {count} result{plural}"), false);
                }
            }
            Err(Error::ParseFailure(msg)) => {
                warn!("Unreadable search response for '{}': {}", keyword, msg);
                self.replace_registry(generation, Vec::new());
                self.status(&format!("Invalid catalogue response: {msg}"), true);
            }
            Err(e) => {
                warn!("Search '{}' failed: {}", keyword, e);
                self.status(&e.to_string(), true);
            }
        }
    }

    /// Replace the registry with the result of search `generation`
    ///
    /// Outcomes confirmed after that search was fired are reapplied, since
    /// the response may not reflect them. Older outcomes are dropped and the
    /// server's flag wins.
    fn replace_registry(&mut self, generation: u64, mut packages: Vec<Package>) -> usize {
        for pkg in &mut packages {
            if let Some(&(installed, confirmed_at)) = self.confirmed.get(&pkg.id) {
                if confirmed_at >= generation {
                    pkg.installed = installed;
                }
            }
        }
        self.confirmed.retain(|_, (_, confirmed_at)| *confirmed_at > generation);
        let count = self.registry.replace_all(packages);
        self.publish_registry();
        count
    }

    fn start_operation(&mut self, id: String, kind: OperationKind) {
        if let Some(op) = self.pending.get(&id) {
            debug!("Ignoring {} of {}: {} already in flight", kind, id, op.kind);
            return;
        }

        let Some(package) = self.registry.get(&id).cloned() else {
            debug!("Ignoring {} of {}: {}", kind, id, Error::NotFound(id.clone()));
            return;
        };

        if package.installed == kind.target_state() {
            debug!("Ignoring {} of {}: already in target state", kind, id);
            return;
        }

        self.pending.begin(&id, kind);
        let verb = match kind {
            OperationKind::Install => "Installing",
            OperationKind::Uninstall => "Uninstalling",
        };
        info!("{} {}", verb, id);
        self.status(&format!("{verb} {} …", package.name), false);

        let transport = Arc::clone(&self.transport);
        let endpoint = self.config.endpoint.clone();
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = match kind {
                OperationKind::Install => {
                    let progress_tx = completions.clone();
                    let progress_id = package.id.clone();
                    let mut progress = move |percent: u8| {
                        let _ = progress_tx.send(Completion::Progress {
                            id: progress_id.clone(),
                            percent,
                        });
                    };
                    transport.install(&package, &endpoint, &mut progress).await
                }
                OperationKind::Uninstall => transport.uninstall(&package, &endpoint).await,
            };

            let _ = completions.send(Completion::Operation {
                id: package.id,
                name: package.name,
                kind,
                result,
            });
        });
    }

    fn finish_operation(&mut self, id: String, name: &str, kind: OperationKind, result: Result<()>) {
        if self.pending.finish(&id).is_none() {
            warn!("Completion for {} of {} with no pending entry", kind, id);
        }

        match result {
            Ok(()) => {
                let installed = kind.target_state();
                info!("Finished {} of {}", kind, id);
                if self.registry.set_installed_flag(&id, installed) {
                    self.publish_registry();
                } else {
                    debug!("{} left the registry before its {} completed", id, kind);
                }
                self.confirmed.insert(id, (installed, self.generation));

                let text = match kind {
                    OperationKind::Install => format!("Installed {name}"),
                    OperationKind::Uninstall => format!("Uninstalled {name}"),
                };
                self.status(&text, false);
            }
            Err(e) => {
                warn!("{} of {} failed: {}", kind, id, e);
                let text = match kind {
                    OperationKind::Install => format!("Installation of {name} failed: {e}"),
                    OperationKind::Uninstall => format!("Removal of {name} failed: {e}"),
                };
                self.status(&text, true);
            }
        }
    }

    fn publish_registry(&self) {
        let (installed, recommended) = self.registry.partition();
        self.emit(SyncEvent::RegistryChanged {
            installed,
            recommended,
        });
    }

    fn status(&self, text: &str, is_error: bool) {
        self.emit(SyncEvent::StatusMessage {
            text: text.to_string(),
            is_error,
        });
    }

    fn emit(&self, event: SyncEvent) {
        // Nobody listening is not an error; the registry stays authoritative
        let _ = self.events.send(event);
    }
}
