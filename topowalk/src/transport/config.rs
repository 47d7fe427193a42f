//! SSH connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    AcceptNew,

    /// Accept all keys without checking. Unprovisioned switches come up with
    /// fresh keys, so this is the default for discovery.
    #[default]
    Disabled,
}

/// SSH connection configuration for a single login attempt.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Password for authentication.
    pub password: SecretString,

    /// Connection timeout.
    pub timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_key_verification_deserialize() {
        let mode: HostKeyVerification = serde_yaml::from_str("accept_new").unwrap();
        assert_eq!(mode, HostKeyVerification::AcceptNew);
        assert_eq!(HostKeyVerification::default(), HostKeyVerification::Disabled);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = SshConfig {
            host: "10.0.0.1".into(),
            port: 22,
            username: "admin".into(),
            password: SecretString::from("private".to_string()),
            timeout: Duration::from_secs(5),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::Disabled,
            known_hosts_path: None,
        };
        assert_eq!(config.socket_addr(), "10.0.0.1:22");
        assert!(!format!("{config:?}").contains("private"));
    }
}
