// src/package.rs

//! Catalogue package model
//!
//! A `Package` is the unit the server publishes and the client tracks.
//! Only `installed` is ever mutated locally; everything else is replaced
//! wholesale on each search refresh.

use serde::{Deserialize, Serialize};

/// Highest rating shown to users
pub const MAX_RATING: f64 = 5.0;

/// A single installable extension as published by the catalogue server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Unique, stable identifier (e.g. "salome.geometry")
    pub id: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    /// Search keywords, in display order
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional remote icon reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub rating: f64,
    /// Popularity counter
    #[serde(default)]
    pub installs: u64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub installed: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Package {
    /// Create a package with the given id and name and empty metadata
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: String::new(),
            author: String::new(),
            description: String::new(),
            tags: Vec::new(),
            icon_url: None,
            rating: 0.0,
            installs: 0,
            installed: false,
        }
    }

    /// Rating clamped to the displayable 0.0-5.0 range
    pub fn display_rating(&self) -> f64 {
        if self.rating.is_nan() {
            return 0.0;
        }
        self.rating.clamp(0.0, MAX_RATING)
    }

    /// Case-insensitive substring match against name, description, author and tags
    ///
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.author.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }
}
