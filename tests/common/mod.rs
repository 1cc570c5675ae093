// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use extcat::server::{serve, ServerState};
use extcat::{
    Catalog, CatalogTransport, Error, Package, ProgressSink, Result, SyncConfig, SyncEvent,
    SyncEvents,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

/// How a scripted search should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFailure {
    Transport,
    Malformed,
}

/// Scripted catalogue transport that records every request.
///
/// Searches filter the catalogue the same way the real server does.
/// Installs report `progress_steps` spaced by `step_delay`, then succeed
/// unless the id was marked as failing.
pub struct MockTransport {
    catalogue: Vec<Package>,
    search_delays: Mutex<HashMap<String, Duration>>,
    search_failure: Mutex<Option<SearchFailure>>,
    failing: Mutex<HashSet<String>>,
    progress_steps: Vec<u8>,
    step_delay: Duration,
    searches: Mutex<Vec<String>>,
    installs: Mutex<Vec<String>>,
    uninstalls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new(catalogue: Vec<Package>) -> Self {
        Self {
            catalogue,
            search_delays: Mutex::new(HashMap::new()),
            search_failure: Mutex::new(None),
            failing: Mutex::new(HashSet::new()),
            progress_steps: vec![25, 50, 100],
            step_delay: Duration::from_millis(10),
            searches: Mutex::new(Vec::new()),
            installs: Mutex::new(Vec::new()),
            uninstalls: Mutex::new(Vec::new()),
        }
    }

    /// Slow down operations so they stay in flight longer
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Delay the response to searches for `keyword`
    pub fn delay_search(&self, keyword: &str, delay: Duration) {
        self.search_delays
            .lock()
            .unwrap()
            .insert(keyword.to_string(), delay);
    }

    pub fn fail_searches(&self, failure: Option<SearchFailure>) {
        *self.search_failure.lock().unwrap() = failure;
    }

    /// Make install/uninstall of `id` fail
    pub fn fail_operations_for(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn installs(&self) -> Vec<String> {
        self.installs.lock().unwrap().clone()
    }

    pub fn uninstalls(&self) -> Vec<String> {
        self.uninstalls.lock().unwrap().clone()
    }

    fn outcome(&self, id: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(id) {
            Err(Error::ServerRejected {
                status: 500,
                message: "simulated failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CatalogTransport for MockTransport {
    async fn search(&self, keyword: &str, _endpoint: &Url) -> Result<Vec<Package>> {
        self.searches.lock().unwrap().push(keyword.to_string());

        let delay = self.search_delays.lock().unwrap().get(keyword).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = *self.search_failure.lock().unwrap();
        match failure {
            Some(SearchFailure::Transport) => {
                return Err(Error::Transport("connection refused".to_string()));
            }
            Some(SearchFailure::Malformed) => {
                return Err(Error::ParseFailure("Expected a JSON array of packages".to_string()));
            }
            None => {}
        }

        let needle = keyword.trim().to_lowercase();
        Ok(self
            .catalogue
            .iter()
            .filter(|pkg| pkg.matches(&needle))
            .cloned()
            .collect())
    }

    async fn install(
        &self,
        package: &Package,
        _endpoint: &Url,
        progress: &mut dyn ProgressSink,
    ) -> Result<()> {
        self.installs.lock().unwrap().push(package.id.clone());
        for step in &self.progress_steps {
            tokio::time::sleep(self.step_delay).await;
            progress.report(*step);
        }
        self.outcome(&package.id)
    }

    async fn uninstall(&self, package: &Package, _endpoint: &Url) -> Result<()> {
        self.uninstalls.lock().unwrap().push(package.id.clone());
        tokio::time::sleep(self.step_delay).await;
        self.outcome(&package.id)
    }
}

/// Package with the given id, name, tags and installed flag
pub fn package(id: &str, name: &str, tags: &[&str], installed: bool) -> Package {
    let mut pkg = Package::new(id, name);
    pkg.version = "1.0.0".to_string();
    pkg.author = "Test Suite".to_string();
    pkg.tags = tags.iter().map(|t| t.to_string()).collect();
    pkg.installed = installed;
    pkg
}

/// Three-package catalogue: "geo" matches a, "mesh" matches b and c
pub fn sample_catalogue() -> Vec<Package> {
    vec![
        package("a", "Alpha", &["geo"], false),
        package("b", "Beta", &["mesh"], true),
        package("c", "Gamma", &["mesh", "hexa"], false),
    ]
}

pub fn endpoint() -> Url {
    Url::parse("http://catalogue.test/").unwrap()
}

/// Controller config without the initial full-catalogue load
pub fn quiet_config() -> SyncConfig {
    SyncConfig::new(endpoint()).with_initial_load(false)
}

/// Collect every event published so far
pub fn drain(events: &mut SyncEvents) -> Vec<SyncEvent> {
    let mut collected = Vec::new();
    while let Ok(event) = events.try_recv() {
        collected.push(event);
    }
    collected
}

/// Ids of the views carried by each RegistryChanged event, in order
pub fn registry_changes(events: &[SyncEvent]) -> Vec<(Vec<String>, Vec<String>)> {
    events
        .iter()
        .filter_map(|event| match event {
            SyncEvent::RegistryChanged {
                installed,
                recommended,
            } => Some((ids(installed), ids(recommended))),
            _ => None,
        })
        .collect()
}

/// Status messages in order
pub fn statuses(events: &[SyncEvent]) -> Vec<(String, bool)> {
    events
        .iter()
        .filter_map(|event| match event {
            SyncEvent::StatusMessage { text, is_error } => Some((text.clone(), *is_error)),
            _ => None,
        })
        .collect()
}

/// Progress percentages reported for `id`, in order
pub fn progress_for(events: &[SyncEvent], id: &str) -> Vec<u8> {
    events
        .iter()
        .filter_map(|event| match event {
            SyncEvent::InstallProgress { id: pid, percent } if pid == id => Some(*percent),
            _ => None,
        })
        .collect()
}

pub fn ids(packages: &[Package]) -> Vec<String> {
    packages.iter().map(|p| p.id.clone()).collect()
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Start a catalogue server on an ephemeral port and return its base URL
pub async fn spawn_server(catalog: Catalog) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, Arc::new(ServerState::new(catalog))));
    Url::parse(&format!("http://{addr}/")).unwrap()
}

/// Base URL on which nothing is listening
pub async fn dead_endpoint() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}/")).unwrap()
}
