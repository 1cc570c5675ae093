// src/error.rs

//! Error types for catalogue synchronization
//!
//! The taxonomy mirrors what a caller can do about a failure:
//! - `Transport`: the request never produced a usable response (retry later)
//! - `ParseFailure`: the server answered with something we cannot read
//! - `ServerRejected`: the server answered with a non-success status
//! - `NotFound`: the id is not in the local registry (silently ignored by the controller)

use thiserror::Error;

/// Errors produced by the catalogue client, server helpers and sync controller
#[derive(Error, Debug)]
pub enum Error {
    /// Connection refused, timeout, or disconnect mid-response
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body is not valid JSON or does not have the expected shape
    #[error("Failed to parse response: {0}")]
    ParseFailure(String),

    /// Server answered with a non-success status
    #[error("Server rejected request (HTTP {status}): {message}")]
    ServerRejected { status: u16, message: String },

    /// Package id is not present in the registry
    #[error("Package not found: {0}")]
    NotFound(String),

    /// Endpoint URL cannot be used to build a request
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The sync controller task has exited
    #[error("Sync controller has stopped")]
    ControllerStopped,
}

impl Error {
    /// Whether retrying the same request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_))
            || matches!(self, Error::ServerRejected { status, .. } if *status >= 500)
    }
}

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;
