//! Error types for topowalk.
//!
//! Errors are layered the same way the crate is: connection, channel and
//! session errors come from talking to one switch, collection errors from
//! reading its output, and discovery errors from the run as a whole. Only
//! [`DiscoveryError`] ever aborts a run; everything else is recorded on the
//! topology graph against the node it happened to.

use std::io;
use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;

use crate::model::{Capability, Vendor};

/// Main error type for topowalk operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH connection-level errors
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session-level errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Credential table / configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Run-level discovery errors
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
}

impl Error {
    /// Whether this error is an authentication rejection.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(
            self,
            Error::Connection(ConnectionError::AuthenticationFailed { .. })
        )
    }

    /// Whether this error is a timeout at any layer.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Connection(ConnectionError::Timeout(_))
                | Error::Channel(ChannelError::PatternTimeout(_))
                | Error::Session(SessionError::CommandTimeout { .. })
        )
    }
}

/// Connection errors (TCP connect, SSH handshake, authentication).
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host key does not match the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host is not in known_hosts and strict checking is enabled
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Session errors (command execution on an open session).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session not connected
    #[error("Session not connected")]
    NotConnected,

    /// Command did not return to the prompt in time
    #[error("Command '{command}' timed out after {after:?}")]
    CommandTimeout { command: String, after: Duration },
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Platform name is not registered
    #[error("Unknown platform: {name}")]
    UnknownPlatform { name: String },

    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },
}

/// Credential table and configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not read the configuration file
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The file is not valid YAML for the expected shape
    #[error("Malformed credential table: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A vendor key that no collector exists for
    #[error("Unknown vendor '{name}' in credential table")]
    UnknownVendor { name: String },

    /// A structurally valid but unusable entry
    #[error("Invalid entry for vendor '{vendor}': {message}")]
    InvalidEntry { vendor: String, message: String },
}

/// Run-level failures. These are the only errors that abort a discovery run,
/// and they are raised before any probing starts.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Seed is not a valid IP address
    #[error("Invalid seed address '{seed}'")]
    InvalidSeed { seed: String },

    /// No vendor has any credential to try
    #[error("Credential table is empty")]
    EmptyCredentials,
}

/// No vendor/credential combination matched an address.
///
/// Terminal for that address only; the engine records it on the graph as an
/// unreachable placeholder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No vendor detected at {address} (tried: {})", display_vendors(.attempted))]
pub struct DetectionFailure {
    /// Address that was probed.
    pub address: IpAddr,

    /// Vendors that were attempted, in probe order.
    pub attempted: Vec<Vendor>,
}

fn display_vendors(vendors: &[Vendor]) -> String {
    if vendors.is_empty() {
        return "none".to_string();
    }
    vendors
        .iter()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Vendor output did not have the expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not parse {capability} output: {reason}")]
pub struct ParseError {
    /// Capability whose output failed to parse.
    pub capability: Capability,

    /// What was missing or malformed.
    pub reason: String,

    /// The raw output, kept for diagnostics.
    pub raw: String,
}

impl ParseError {
    pub fn new(capability: Capability, reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            capability,
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}

/// Failure of a single capability call on a detected switch.
///
/// Each variant degrades only the field it belongs to.
#[derive(Error, Debug)]
pub enum CollectError {
    /// Output did not match the vendor's expected shape
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The capability call exceeded its time budget
    #[error("{capability} collection timed out after {after:?}")]
    Timeout {
        capability: Capability,
        after: Duration,
    },

    /// The command itself failed (device error string or broken session)
    #[error("{capability} command failed: {message}")]
    Command {
        capability: Capability,
        message: String,
    },
}

/// Result type alias using topowalk's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_failure_display() {
        let failure = DetectionFailure {
            address: "10.0.0.9".parse().unwrap(),
            attempted: vec![Vendor::Hirschmann, Vendor::Kontron],
        };
        assert_eq!(
            failure.to_string(),
            "No vendor detected at 10.0.0.9 (tried: hirschmann, kontron)"
        );

        let failure = DetectionFailure {
            address: "10.0.0.9".parse().unwrap(),
            attempted: vec![],
        };
        assert!(failure.to_string().ends_with("(tried: none)"));
    }

    #[test]
    fn test_auth_rejection_is_classified() {
        let err: Error = ConnectionError::AuthenticationFailed {
            user: "admin".into(),
        }
        .into();
        assert!(err.is_auth_rejection());
        assert!(!err.is_timeout());

        let err: Error = ConnectionError::Timeout(Duration::from_secs(3)).into();
        assert!(!err.is_auth_rejection());
        assert!(err.is_timeout());
    }
}
