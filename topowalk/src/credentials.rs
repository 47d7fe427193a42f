//! Credential table: which logins to try for each vendor, and how to connect.
//!
//! Loaded from YAML:
//!
//! ```yaml
//! ssh_settings:
//!   port: 22
//!   timeout: 30
//!   retry_attempts: 2
//!   retry_delay: 5
//! credentials:
//!   hirschmann:
//!     default_username: admin
//!     default_password: private
//!     alternative_credentials:
//!       - { username: user, password: public }
//!     ssh_settings: { port: 2222 }
//! ```
//!
//! Loading fails on the first malformed entry rather than skipping it.

use std::fmt;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::model::Vendor;
use crate::session::RemoteTarget;
use crate::transport::HostKeyVerification;

/// One username/secret pair.
#[derive(Clone)]
pub struct Credential {
    pub username: String,
    pub secret: SecretString,
}

impl Credential {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: SecretString::from(secret.into()),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Connection parameters shared by every login to one vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub port: u16,
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub host_key_verification: HostKeyVerification,
    pub known_hosts_path: Option<PathBuf>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            port: 22,
            timeout: Duration::from_secs(30),
            retry_attempts: 1,
            retry_delay: Duration::from_secs(2),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}

impl SessionSettings {
    /// Connection target for `address` with these settings.
    pub fn target(&self, address: IpAddr) -> RemoteTarget {
        RemoteTarget {
            address,
            port: self.port,
            timeout: self.timeout,
            retry_attempts: self.retry_attempts,
            retry_delay: self.retry_delay,
            host_key_verification: self.host_key_verification.clone(),
            known_hosts_path: self.known_hosts_path.clone(),
        }
    }

    fn overlay(&self, raw: &RawSettings) -> Self {
        Self {
            port: raw.port.unwrap_or(self.port),
            timeout: raw.timeout.map(Duration::from_secs).unwrap_or(self.timeout),
            retry_attempts: raw.retry_attempts.unwrap_or(self.retry_attempts),
            retry_delay: raw.retry_delay.map(Duration::from_secs).unwrap_or(self.retry_delay),
            host_key_verification: raw
                .host_key_verification
                .clone()
                .unwrap_or_else(|| self.host_key_verification.clone()),
            known_hosts_path: raw
                .known_hosts_path
                .clone()
                .or_else(|| self.known_hosts_path.clone()),
        }
    }
}

/// Ordered credentials and connection settings for one vendor.
#[derive(Debug, Clone)]
pub struct VendorCredentials {
    /// Tried in order; the first one that logs in wins.
    pub credentials: Vec<Credential>,
    pub settings: SessionSettings,
}

/// Credentials for every vendor discovery should try.
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    vendors: IndexMap<Vendor, VendorCredentials>,
}

impl CredentialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a vendor's credentials with default settings.
    pub fn with_vendor(mut self, vendor: Vendor, credentials: Vec<Credential>) -> Self {
        self.vendors.insert(
            vendor,
            VendorCredentials {
                credentials,
                settings: SessionSettings::default(),
            },
        );
        self
    }

    /// Replace a vendor's connection settings. No-op for absent vendors.
    pub fn with_settings(mut self, vendor: Vendor, settings: SessionSettings) -> Self {
        if let Some(entry) = self.vendors.get_mut(&vendor) {
            entry.settings = settings;
        }
        self
    }

    /// Load and validate a credential file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse and validate a credential document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: RawFile = serde_yaml::from_str(text).map_err(ConfigError::from)?;
        let shared = SessionSettings::default().overlay(&raw.ssh_settings);

        let mut vendors = IndexMap::new();
        for (name, entry) in raw.credentials {
            let vendor: Vendor = name
                .parse()
                .map_err(|_| ConfigError::UnknownVendor { name: name.clone() })?;
            let invalid = |message: &str| ConfigError::InvalidEntry {
                vendor: name.clone(),
                message: message.to_string(),
            };

            let mut credentials = Vec::new();
            match (entry.default_username, entry.default_password) {
                (Some(username), Some(password)) => credentials.push((username, password)),
                (None, None) => {}
                (Some(_), None) => return Err(invalid("default_username without default_password").into()),
                (None, Some(_)) => return Err(invalid("default_password without default_username").into()),
            }
            credentials.extend(
                entry
                    .alternative_credentials
                    .into_iter()
                    .map(|alt| (alt.username, alt.password)),
            );

            if credentials.is_empty() {
                return Err(invalid("no credentials").into());
            }
            if credentials.iter().any(|(username, _)| username.trim().is_empty()) {
                return Err(invalid("empty username").into());
            }

            let settings = shared.overlay(&entry.ssh_settings);
            if settings.timeout.is_zero() {
                return Err(invalid("timeout must be positive").into());
            }

            vendors.insert(
                vendor,
                VendorCredentials {
                    credentials: credentials
                        .into_iter()
                        .map(|(username, password)| Credential::new(username, password))
                        .collect(),
                    settings,
                },
            );
        }

        if shared.timeout.is_zero() {
            return Err(ConfigError::InvalidEntry {
                vendor: "ssh_settings".to_string(),
                message: "timeout must be positive".to_string(),
            }
            .into());
        }

        Ok(Self { vendors })
    }

    pub fn get(&self, vendor: Vendor) -> Option<&VendorCredentials> {
        self.vendors.get(&vendor)
    }

    /// Vendors with at least one credential, in probe order.
    pub fn probe_order(&self) -> impl Iterator<Item = (Vendor, &VendorCredentials)> {
        Vendor::ALL.into_iter().filter_map(|vendor| {
            self.vendors
                .get(&vendor)
                .filter(|entry| !entry.credentials.is_empty())
                .map(|entry| (vendor, entry))
        })
    }

    /// Whether there is nothing at all to try.
    pub fn is_empty(&self) -> bool {
        self.probe_order().next().is_none()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFile {
    #[serde(default)]
    ssh_settings: RawSettings,
    #[serde(default)]
    credentials: IndexMap<String, RawVendor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    port: Option<u16>,
    timeout: Option<u64>,
    retry_attempts: Option<u32>,
    retry_delay: Option<u64>,
    host_key_verification: Option<HostKeyVerification>,
    known_hosts_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVendor {
    default_username: Option<String>,
    default_password: Option<String>,
    #[serde(default)]
    alternative_credentials: Vec<RawCredential>,
    #[serde(default)]
    ssh_settings: RawSettings,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCredential {
    username: String,
    password: String,
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;
    use crate::error::Error;

    const SAMPLE: &str = r#"
ssh_settings:
  port: 22
  timeout: 20
  retry_attempts: 2
  retry_delay: 5
credentials:
  kontron:
    default_username: admin
    default_password: admin
  hirschmann:
    default_username: admin
    default_password: private
    alternative_credentials:
      - { username: user, password: public }
    ssh_settings:
      port: 2222
"#;

    #[test]
    fn test_load_sample() {
        let table = CredentialTable::from_yaml_str(SAMPLE).unwrap();

        // Probe order is fixed, not file order
        let order: Vec<_> = table.probe_order().map(|(v, _)| v).collect();
        assert_eq!(order, vec![Vendor::Hirschmann, Vendor::Kontron]);

        let hirschmann = table.get(Vendor::Hirschmann).unwrap();
        assert_eq!(hirschmann.credentials.len(), 2);
        assert_eq!(hirschmann.credentials[1].username, "user");
        assert_eq!(hirschmann.credentials[1].secret.expose_secret(), "public");
        assert_eq!(hirschmann.settings.port, 2222);
        assert_eq!(hirschmann.settings.timeout, Duration::from_secs(20));
        assert_eq!(hirschmann.settings.retry_attempts, 2);

        let kontron = table.get(Vendor::Kontron).unwrap();
        assert_eq!(kontron.settings.port, 22);
        assert_eq!(kontron.settings.retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_unknown_vendor_rejected() {
        let err = CredentialTable::from_yaml_str(
            "credentials:\n  cisco:\n    default_username: a\n    default_password: b\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::UnknownVendor { ref name }) if name == "cisco"
        ));
    }

    #[test]
    fn test_malformed_entries_rejected() {
        let cases = [
            "credentials:\n  nomad:\n    default_username: admin\n",
            "credentials:\n  nomad: {}\n",
            "credentials:\n  nomad:\n    default_username: ' '\n    default_password: x\n",
            "ssh_settings: { timeout: 0 }\ncredentials:\n  nomad:\n    default_username: a\n    default_password: b\n",
            "credentials:\n  nomad:\n    default_username: a\n    default_password: b\n    enable_password: c\n",
        ];
        for case in cases {
            assert!(
                matches!(CredentialTable::from_yaml_str(case), Err(Error::Config(_))),
                "accepted: {case}"
            );
        }
    }

    #[test]
    fn test_empty_table() {
        assert!(CredentialTable::from_yaml_str("credentials: {}\n").unwrap().is_empty());
        assert!(CredentialTable::new().is_empty());
        assert!(
            CredentialTable::new()
                .with_vendor(Vendor::Lantech, vec![])
                .is_empty()
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credential = Credential::new("admin", "hunter2");
        let debug = format!("{:?}", credential);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }
}
