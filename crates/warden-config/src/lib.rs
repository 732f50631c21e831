//! Shared configuration for the warden daemon and its launcher.
//!
//! The daemon ingests command requests over two connected channels: a JSON
//! control stream and a companion descriptor channel. Both endpoints, plus
//! the logging knobs, are declared here so the daemon and whatever process
//! wires up the channels agree on one source of truth.

mod defaults;
mod logging;
mod socket;

pub use defaults::{DEFAULT_LOG_FILTER, default_control_endpoint, default_descriptor_endpoint};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

use serde::{Deserialize, Serialize};

/// Declarative configuration shared by the daemon and its launcher.
///
/// Every field carries a platform default, so a partially-specified
/// configuration document deserializes into a complete value.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Endpoint carrying the JSON control stream.
    pub control_socket: SocketEndpoint,
    /// Endpoint carrying descriptor transfers for redirections.
    pub descriptor_socket: SocketEndpoint,
    /// Filter expression handed to the tracing subscriber.
    pub log_filter: String,
    /// Output format for structured logs.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            control_socket: default_control_endpoint(),
            descriptor_socket: default_descriptor_endpoint(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Configured log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Endpoint the control stream is served on.
    #[must_use]
    pub fn control_socket(&self) -> &SocketEndpoint {
        &self.control_socket
    }

    /// Endpoint the descriptor channel is served on.
    #[must_use]
    pub fn descriptor_socket(&self) -> &SocketEndpoint {
        &self.descriptor_socket
    }
}
