//! # Homeshell Telemetry
//!
//! Structured logging for the shell. Everything logs through `tracing`;
//! this crate only decides where those events go.

pub mod logging;

use serde::{Deserialize, Serialize};

pub use logging::{LogLevel, filter_for, init};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is unset
    pub level: LogLevel,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
    /// Include the event target (module path)
    pub with_target: bool,
    /// Per-target overrides, e.g. `window_manager=debug`
    pub directives: Vec<String>,
}

impl LogConfig {
    /// `EnvFilter` directive string for this configuration
    pub fn directive(&self) -> String {
        let mut parts = vec![self.level.as_str().to_string()];
        parts.extend(self.directives.iter().cloned());
        parts.join(",")
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            json: false,
            with_target: true,
            directives: Vec::new(),
        }
    }
}
