// src/server/catalog.rs
//! In-memory catalogue served by the extension server
//!
//! The catalogue is read-only once loaded, so it can be shared across
//! connections without locking.

use crate::package::Package;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Catalogue bundled into the binary
const BUILTIN_CATALOGUE: &str = include_str!("../../data/catalogue.json");

/// Fixed list of packages answering search and install queries
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    packages: Vec<Package>,
}

impl Catalog {
    /// Create a catalogue from packages, keeping the first entry for each id
    pub fn new(packages: Vec<Package>) -> Self {
        let mut seen = HashSet::new();
        let packages = packages
            .into_iter()
            .filter(|pkg| {
                let fresh = seen.insert(pkg.id.clone());
                if !fresh {
                    tracing::warn!("Duplicate catalogue id '{}' ignored", pkg.id);
                }
                fresh
            })
            .collect();
        Self { packages }
    }

    /// The catalogue shipped with extcat
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOGUE).context("Bundled catalogue is invalid")
    }

    /// Parse a catalogue from a JSON array of packages
    pub fn from_json(json: &str) -> Result<Self> {
        let packages: Vec<Package> =
            serde_json::from_str(json).context("Catalogue must be a JSON array of packages")?;
        Ok(Self::new(packages))
    }

    /// Load a catalogue from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalogue {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Failed to parse catalogue {}", path.display()))
    }

    /// Packages matching `keyword`, in catalogue order
    ///
    /// The keyword is trimmed and matched case-insensitively against name,
    /// description, author and tags. An empty keyword returns everything.
    pub fn search(&self, keyword: &str) -> Vec<&Package> {
        let needle = keyword.trim().to_lowercase();
        self.packages.iter().filter(|pkg| pkg.matches(&needle)).collect()
    }

    /// Look up a package by id
    pub fn find(&self, id: &str) -> Option<&Package> {
        self.packages.iter().find(|pkg| pkg.id == id)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
