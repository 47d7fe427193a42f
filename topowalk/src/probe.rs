//! Vendor detection by trial login.
//!
//! There is no protocol-level way to ask a switch who made it, so the probe
//! walks the credential table in a fixed vendor order, logs in with each
//! credential, runs the vendor's identification command and looks for one of
//! its signatures. The first match wins and its session is handed over still
//! open, so collection does not have to log in again.

use std::net::IpAddr;
use std::time::Duration;

use log::{trace, warn};

use crate::credentials::{Credential, CredentialTable};
use crate::error::DetectionFailure;
use crate::events::{DiscoveryEvent, EventSink};
use crate::model::Vendor;
use crate::platform::{PlatformDefinition, PlatformRegistry};
use crate::session::{Connector, Session, open_with_retry};

/// A switch whose vendor was confirmed, with the session that confirmed it.
pub struct Detection<S> {
    pub vendor: Vendor,
    pub credential: Credential,
    pub session: S,
}

/// Outcome of running the identification command on a fresh login.
enum Identified {
    Matched(String),
    Mismatch,
    Failed(String),
}

/// Detects the vendor of a switch.
pub struct VendorProbe<'a, C: Connector> {
    connector: &'a C,
    credentials: &'a CredentialTable,
    platforms: &'a PlatformRegistry,
    sink: &'a dyn EventSink,
    identify_timeout: Duration,
}

impl<'a, C: Connector> VendorProbe<'a, C> {
    pub fn new(
        connector: &'a C,
        credentials: &'a CredentialTable,
        platforms: &'a PlatformRegistry,
        sink: &'a dyn EventSink,
        identify_timeout: Duration,
    ) -> Self {
        Self {
            connector,
            credentials,
            platforms,
            sink,
            identify_timeout,
        }
    }

    /// Find the vendor and credential that work for `address`.
    ///
    /// A connection error moves on to the vendor's next credential. A login
    /// whose identification output does not match moves on to the next
    /// vendor: the credential was right but the switch is someone else's.
    pub async fn detect(&self, address: IpAddr) -> Result<Detection<C::Session>, DetectionFailure> {
        let mut attempted = Vec::new();

        for (vendor, entry) in self.credentials.probe_order() {
            let Some(platform) = self.platforms.get(vendor) else {
                warn!("{}: no platform registered for {}, skipping", address, vendor);
                continue;
            };
            attempted.push(vendor);
            let target = entry.settings.target(address);

            for credential in &entry.credentials {
                self.sink.emit(&DiscoveryEvent::ProbeAttempt {
                    address,
                    vendor,
                    username: credential.username.clone(),
                });

                let mut session =
                    match open_with_retry(self.connector, &target, credential, platform).await {
                        Ok(session) => session,
                        Err(e) => {
                            self.failed(address, vendor, credential, e.to_string());
                            continue;
                        }
                    };

                match self.identify(&mut session, platform).await {
                    Identified::Matched(signature) => {
                        trace!("{}: '{}' matched {}", address, signature, vendor);
                        self.sink.emit(&DiscoveryEvent::VendorDetected {
                            address,
                            vendor,
                            username: credential.username.clone(),
                        });
                        return Ok(Detection {
                            vendor,
                            credential: credential.clone(),
                            session,
                        });
                    }
                    Identified::Mismatch => {
                        close_quietly(address, session).await;
                        self.failed(address, vendor, credential, "signature not found".into());
                        break;
                    }
                    Identified::Failed(reason) => {
                        close_quietly(address, session).await;
                        self.failed(address, vendor, credential, reason);
                        break;
                    }
                }
            }
        }

        Err(DetectionFailure { address, attempted })
    }

    async fn identify(&self, session: &mut C::Session, platform: &PlatformDefinition) -> Identified {
        let command = &platform.identification.command;
        let sent = tokio::time::timeout(
            self.identify_timeout,
            session.send_command(command, self.identify_timeout),
        )
        .await;

        let response = match sent {
            Err(_) => {
                return Identified::Failed(format!(
                    "'{}' timed out after {:?}",
                    command, self.identify_timeout
                ));
            }
            Ok(Err(e)) => return Identified::Failed(e.to_string()),
            Ok(Ok(response)) => response,
        };
        if let Some(message) = response.failure_message {
            return Identified::Failed(message);
        }

        let Some(signature) = platform.identification.matched_signature(&response.result) else {
            return Identified::Mismatch;
        };

        // Signatures are assumed exclusive; the earlier vendor wins when not.
        let others: Vec<Vendor> = self
            .platforms
            .vendors()
            .filter(|other| *other != platform.vendor)
            .filter(|other| {
                self.platforms
                    .get(*other)
                    .and_then(|p| p.identification.matched_signature(&response.result))
                    .is_some()
            })
            .collect();
        if !others.is_empty() {
            warn!(
                "'{}' output also matches {:?}; keeping {}",
                command, others, platform.vendor
            );
        }

        Identified::Matched(signature.to_string())
    }

    fn failed(&self, address: IpAddr, vendor: Vendor, credential: &Credential, reason: String) {
        self.sink.emit(&DiscoveryEvent::ProbeFailed {
            address,
            vendor,
            username: credential.username.clone(),
            reason,
        });
    }
}

async fn close_quietly<S: Session>(address: IpAddr, session: S) {
    if let Err(e) = session.close().await {
        trace!("{}: error closing probe session: {}", address, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::SessionSettings;
    use crate::testing::{self, FakeNetwork, FakeSwitch, RecordingSink};

    fn table() -> CredentialTable {
        let no_retry = SessionSettings {
            retry_attempts: 0,
            ..SessionSettings::default()
        };
        CredentialTable::new()
            .with_vendor(
                Vendor::Hirschmann,
                vec![Credential::new("admin", "private"), Credential::new("user", "public")],
            )
            .with_vendor(Vendor::Kontron, vec![Credential::new("admin", "admin")])
            .with_settings(Vendor::Hirschmann, no_retry.clone())
            .with_settings(Vendor::Kontron, no_retry)
    }

    #[tokio::test]
    async fn test_detects_and_keeps_session_open() {
        let network = FakeNetwork::new();
        network.add("10.0.0.1", testing::kontron("sw1", &[]));
        let credentials = table();
        let platforms = PlatformRegistry::builtin();
        let sink = RecordingSink::default();
        let probe = VendorProbe::new(&network, &credentials, &platforms, &sink, Duration::from_secs(5));

        let detection = probe.detect("10.0.0.1".parse().unwrap()).await.unwrap();
        assert_eq!(detection.vendor, Vendor::Kontron);
        assert_eq!(detection.credential.username, "admin");
        assert_eq!(network.open_sessions(), 1);

        detection.session.close().await.unwrap();
        assert_eq!(network.open_sessions(), 0);
        assert_eq!(
            sink.count(|e| matches!(e, DiscoveryEvent::VendorDetected { .. })),
            1
        );
    }

    #[tokio::test]
    async fn test_detection_is_idempotent() {
        let network = FakeNetwork::new();
        network.add(
            "10.0.0.1",
            testing::hirschmann("bobcat", &[]).login("user", "public"),
        );
        let credentials = table();
        let platforms = PlatformRegistry::builtin();
        let sink = RecordingSink::default();
        let probe = VendorProbe::new(&network, &credentials, &platforms, &sink, Duration::from_secs(5));

        let mut results = Vec::new();
        for _ in 0..2 {
            let detection = probe.detect("10.0.0.1".parse().unwrap()).await.unwrap();
            results.push((detection.vendor, detection.credential.username.clone()));
            detection.session.close().await.unwrap();
        }
        assert_eq!(results[0], (Vendor::Hirschmann, "admin".to_string()));
        assert_eq!(results[0], results[1]);
    }

    #[tokio::test]
    async fn test_falls_through_to_alternative_credential() {
        let network = FakeNetwork::new();
        network.add(
            "10.0.0.1",
            FakeSwitch::new("user", "public")
                .reply("show system info", "System Description....Hirschmann BOBCAT"),
        );
        let credentials = table();
        let platforms = PlatformRegistry::builtin();
        let sink = RecordingSink::default();
        let probe = VendorProbe::new(&network, &credentials, &platforms, &sink, Duration::from_secs(5));

        let detection = probe.detect("10.0.0.1".parse().unwrap()).await.unwrap();
        assert_eq!(detection.vendor, Vendor::Hirschmann);
        assert_eq!(detection.credential.username, "user");
        detection.session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_signature_mismatch_moves_to_next_vendor() {
        // Kontron switch that also accepts the Hirschmann login.
        let network = FakeNetwork::new();
        network.add(
            "10.0.0.1",
            testing::kontron("sw1", &[]).login("admin", "private"),
        );
        let credentials = table();
        let platforms = PlatformRegistry::builtin();
        let sink = RecordingSink::default();
        let probe = VendorProbe::new(&network, &credentials, &platforms, &sink, Duration::from_secs(5));

        let detection = probe.detect("10.0.0.1".parse().unwrap()).await.unwrap();
        assert_eq!(detection.vendor, Vendor::Kontron);
        detection.session.close().await.unwrap();

        // The second Hirschmann credential is skipped after the mismatch.
        assert_eq!(network.connect_attempts("10.0.0.1"), 2);
        assert_eq!(network.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_with_attempted_vendors() {
        let network = FakeNetwork::new();
        let credentials = table();
        let platforms = PlatformRegistry::builtin();
        let sink = RecordingSink::default();
        let probe = VendorProbe::new(&network, &credentials, &platforms, &sink, Duration::from_secs(5));

        let failure = match probe.detect("10.0.0.9".parse().unwrap()).await {
            Ok(_) => panic!("detection should fail"),
            Err(failure) => failure,
        };
        assert_eq!(failure.attempted, vec![Vendor::Hirschmann, Vendor::Kontron]);
        assert_eq!(network.connect_attempts("10.0.0.9"), 3);
        assert_eq!(
            sink.count(|e| matches!(e, DiscoveryEvent::ProbeFailed { .. })),
            3
        );
    }
}
