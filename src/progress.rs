// src/progress.rs

//! Install progress reporting
//!
//! Install requests report how much of the response body has arrived as a
//! percentage. The transport hands percentages to a `ProgressSink`; which
//! sink is used depends on who is watching:
//! - `SilentProgress`: No-op for scripted/quiet modes
//! - `LogProgress`: Logs to tracing at ~10% intervals
//! - `indicatif::ProgressBar`: Visual bar for the CLI
//! - any `FnMut(u8) + Send` closure (the sync controller forwards into its event loop)
//!
//! # Example
//!
//! ```ignore
//! use extcat::progress::LogProgress;
//!
//! let mut progress = LogProgress::new("salome.mesh");
//! client.install(&package, &endpoint, &mut progress).await?;
//! ```

use tracing::info;

/// Receives install progress as a percentage in 0..=100
///
/// Percentages handed to a sink are non-decreasing for a single operation.
pub trait ProgressSink: Send {
    fn report(&mut self, percent: u8);
}

impl<F> ProgressSink for F
where
    F: FnMut(u8) + Send,
{
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

impl ProgressSink for indicatif::ProgressBar {
    fn report(&mut self, percent: u8) {
        self.set_position(u64::from(percent));
    }
}

/// Silent progress sink (no-op)
#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn report(&mut self, _percent: u8) {}
}

/// Logging progress sink
///
/// Logs progress updates to tracing at info level. Only logs when a new
/// 10% step is crossed to avoid spam.
#[derive(Debug)]
pub struct LogProgress {
    name: String,
    last_logged: Option<u8>,
}

impl LogProgress {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_logged: None,
        }
    }
}

impl ProgressSink for LogProgress {
    fn report(&mut self, percent: u8) {
        let step = percent / 10;
        if self.last_logged.is_none_or(|last| step > last / 10) {
            self.last_logged = Some(percent);
            info!("{}: {}%", self.name, percent);
        }
    }
}

/// Converts byte counts into non-decreasing percentages
///
/// Returns a percentage only when it advances, so sinks never see
/// duplicates or regressions. With an unknown or zero total no
/// percentages are produced at all.
#[derive(Debug, Clone)]
pub struct PercentTracker {
    total: Option<u64>,
    last: Option<u8>,
}

impl PercentTracker {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            last: None,
        }
    }

    /// Whether this tracker can produce percentages at all
    pub fn is_known(&self) -> bool {
        self.total.is_some()
    }

    /// Record the cumulative number of bytes received
    pub fn advance(&mut self, received: u64) -> Option<u8> {
        let total = self.total?;
        let percent = (received.saturating_mul(100) / total).min(100) as u8;
        if self.last.is_some_and(|last| percent <= last) {
            return None;
        }
        self.last = Some(percent);
        Some(percent)
    }

    /// Last percentage produced
    pub fn last(&self) -> Option<u8> {
        self.last
    }
}
