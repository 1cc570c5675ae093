// src/registry.rs

//! Canonical local view of the catalogue
//!
//! The registry holds the packages from the most recent applied search, in
//! the order the server returned them, plus their locally observed
//! `installed` flag. It is owned by the sync controller; consumers only
//! ever see the derived views the controller publishes.
//!
//! Views are recomputed on demand. That is a linear scan per call, which is
//! fine for catalogues of a few hundred entries.

use crate::package::Package;
use std::collections::HashMap;
use tracing::warn;

/// Ordered, id-unique package store
#[derive(Debug, Default, Clone)]
pub struct ExtensionRegistry {
    packages: Vec<Package>,
    /// id -> position in `packages`
    index: HashMap<String, usize>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a complete new package list
    ///
    /// Duplicate ids keep their first occurrence. Returns the number of
    /// packages retained.
    pub(crate) fn replace_all(&mut self, packages: Vec<Package>) -> usize {
        let mut retained = Vec::with_capacity(packages.len());
        let mut index = HashMap::with_capacity(packages.len());

        for pkg in packages {
            if index.contains_key(&pkg.id) {
                warn!("Ignoring duplicate package id '{}' in search response", pkg.id);
                continue;
            }
            index.insert(pkg.id.clone(), retained.len());
            retained.push(pkg);
        }

        self.packages = retained;
        self.index = index;
        self.packages.len()
    }

    /// Set the installed flag of one package
    ///
    /// Returns false (and does nothing) if the id is not in the registry,
    /// which happens when a search replaced the contents while an
    /// operation was in flight.
    pub(crate) fn set_installed_flag(&mut self, id: &str, value: bool) -> bool {
        match self.index.get(id) {
            Some(&pos) => {
                self.packages[pos].installed = value;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Package> {
        self.index.get(id).map(|&pos| &self.packages[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All packages in last-received order
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Installed packages, in registry order
    pub fn installed_view(&self) -> Vec<&Package> {
        self.packages.iter().filter(|pkg| pkg.installed).collect()
    }

    /// Packages not yet installed, in registry order
    ///
    /// Every non-installed package counts as recommended; there is no ranking.
    pub fn recommended_view(&self) -> Vec<&Package> {
        self.packages.iter().filter(|pkg| !pkg.installed).collect()
    }

    /// Owned copies of both views, taken from the same snapshot
    pub fn partition(&self) -> (Vec<Package>, Vec<Package>) {
        self.packages.iter().cloned().partition(|pkg| pkg.installed)
    }
}
