// src/sync/pending.rs
//! In-flight install/uninstall tracking
//!
//! At most one operation per package id may be in flight. The set is owned
//! by the controller and consulted before any request is issued.

use std::collections::HashMap;
use std::fmt;

/// Kind of operation running for a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Install,
    Uninstall,
}

impl OperationKind {
    /// Value of the installed flag once this operation succeeds
    pub fn target_state(self) -> bool {
        matches!(self, OperationKind::Install)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Install => write!(f, "install"),
            OperationKind::Uninstall => write!(f, "uninstall"),
        }
    }
}

/// An operation currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOperation {
    pub kind: OperationKind,
    /// Last reported progress (0-100); stays 0 for uninstalls
    pub progress: u8,
}

/// Map of package id to its in-flight operation
#[derive(Debug, Default)]
pub struct PendingOperations {
    entries: HashMap<String, PendingOperation>,
}

impl PendingOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new operation; returns false if one is already in flight
    pub fn begin(&mut self, id: &str, kind: OperationKind) -> bool {
        if self.entries.contains_key(id) {
            return false;
        }
        self.entries
            .insert(id.to_string(), PendingOperation { kind, progress: 0 });
        true
    }

    /// Record install progress
    ///
    /// Returns the percentage to publish, or None when the id is not
    /// installing or the value would move progress backwards.
    pub fn update_progress(&mut self, id: &str, percent: u8) -> Option<u8> {
        let entry = self.entries.get_mut(id)?;
        if entry.kind != OperationKind::Install || percent < entry.progress {
            return None;
        }
        entry.progress = percent.min(100);
        Some(entry.progress)
    }

    /// Remove and return the operation for `id`
    pub fn finish(&mut self, id: &str) -> Option<PendingOperation> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&PendingOperation> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
