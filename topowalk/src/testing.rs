//! Scripted switches standing in for SSH in tests.

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::ExposeSecret;

use crate::credentials::Credential;
use crate::error::{ConnectionError, Result, SessionError};
use crate::events::{DiscoveryEvent, EventSink};
use crate::platform::PlatformDefinition;
use crate::session::{Connector, RemoteTarget, Response, Session};

/// Output every supported CLI recognizes as an error.
fn unknown_command(command: &str) -> String {
    format!(
        "% Invalid word detected at '^' marker.\nError: Invalid command '{}'\nUnknown command",
        command
    )
}

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Output(String),
    Hang,
}

/// One scripted switch.
#[derive(Debug, Clone)]
pub(crate) struct FakeSwitch {
    logins: Vec<(String, String)>,
    replies: HashMap<String, Reply>,
    flaky: usize,
}

impl FakeSwitch {
    pub(crate) fn new(username: &str, password: &str) -> Self {
        Self {
            logins: vec![(username.to_string(), password.to_string())],
            replies: HashMap::new(),
            flaky: 0,
        }
    }

    /// Also accept this login.
    pub(crate) fn login(mut self, username: &str, password: &str) -> Self {
        self.logins.push((username.to_string(), password.to_string()));
        self
    }

    pub(crate) fn reply(mut self, command: &str, output: impl Into<String>) -> Self {
        self.replies
            .insert(command.to_string(), Reply::Output(output.into()));
        self
    }

    /// Never answer `command`.
    pub(crate) fn hang(mut self, command: &str) -> Self {
        self.replies.insert(command.to_string(), Reply::Hang);
        self
    }

    /// Drop the first `failures` connections before authentication.
    pub(crate) fn flaky(mut self, failures: usize) -> Self {
        self.flaky = failures;
        self
    }
}

#[derive(Debug, Default)]
struct NetworkState {
    switches: HashMap<IpAddr, FakeSwitch>,
    attempts: HashMap<IpAddr, usize>,
    commands: Vec<(IpAddr, String)>,
    open_sessions: usize,
}

/// A set of scripted switches keyed by address. Addresses without a switch
/// refuse connections.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl FakeNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, address: &str, switch: FakeSwitch) {
        let address = address.parse().unwrap();
        self.state.lock().unwrap().switches.insert(address, switch);
    }

    /// Connection attempts made to `address` so far.
    pub(crate) fn connect_attempts(&self, address: &str) -> usize {
        let address: IpAddr = address.parse().unwrap();
        self.state
            .lock()
            .unwrap()
            .attempts
            .get(&address)
            .copied()
            .unwrap_or(0)
    }

    /// How often `command` was sent to `address`.
    pub(crate) fn command_count(&self, address: &str, command: &str) -> usize {
        let address: IpAddr = address.parse().unwrap();
        self.state
            .lock()
            .unwrap()
            .commands
            .iter()
            .filter(|(addr, cmd)| *addr == address && cmd == command)
            .count()
    }

    /// Sessions opened and not yet closed.
    pub(crate) fn open_sessions(&self) -> usize {
        self.state.lock().unwrap().open_sessions
    }

    fn login(
        &self,
        target: &RemoteTarget,
        credential: &Credential,
        platform: &PlatformDefinition,
    ) -> Result<FakeSession> {
        let mut state = self.state.lock().unwrap();
        *state.attempts.entry(target.address).or_default() += 1;

        let Some(switch) = state.switches.get_mut(&target.address) else {
            return Err(ConnectionError::ConnectionFailed {
                host: target.address.to_string(),
                port: target.port,
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            }
            .into());
        };

        if switch.flaky > 0 {
            switch.flaky -= 1;
            return Err(ConnectionError::Disconnected.into());
        }

        let accepted = switch.logins.iter().any(|(user, pass)| {
            *user == credential.username && pass.as_str() == credential.secret.expose_secret()
        });
        if !accepted {
            return Err(ConnectionError::AuthenticationFailed {
                user: credential.username.clone(),
            }
            .into());
        }

        let replies = switch.replies.clone();
        state.open_sessions += 1;
        Ok(FakeSession {
            address: target.address,
            replies,
            platform: platform.clone(),
            network: self.state.clone(),
        })
    }
}

impl Connector for FakeNetwork {
    type Session = FakeSession;

    async fn connect(
        &self,
        target: &RemoteTarget,
        credential: &Credential,
        platform: &PlatformDefinition,
    ) -> Result<FakeSession> {
        self.login(target, credential, platform)
    }
}

/// Session on a [`FakeSwitch`].
pub(crate) struct FakeSession {
    address: IpAddr,
    replies: HashMap<String, Reply>,
    platform: PlatformDefinition,
    network: Arc<Mutex<NetworkState>>,
}

impl Session for FakeSession {
    async fn send_command(&mut self, command: &str, timeout: Duration) -> Result<Response> {
        self.network
            .lock()
            .unwrap()
            .commands
            .push((self.address, command.to_string()));

        let output = match self.replies.get(command).cloned() {
            Some(Reply::Output(output)) => output,
            Some(Reply::Hang) => {
                tokio::time::sleep(timeout * 2).await;
                return Err(SessionError::CommandTimeout {
                    command: command.to_string(),
                    after: timeout,
                }
                .into());
            }
            None => unknown_command(command),
        };

        let response = Response::new(command, output.clone(), output, "switch#", Duration::ZERO);
        Ok(match self.platform.detect_failure(&response.result) {
            Some(failure) => response.with_failure(failure),
            None => response,
        })
    }

    async fn close(self) -> Result<()> {
        self.network.lock().unwrap().open_sessions -= 1;
        Ok(())
    }
}

/// An LLDP adjacency as seen from the switch being scripted.
#[derive(Debug, Clone)]
pub(crate) struct Link {
    pub local: String,
    pub remote_address: Option<String>,
    pub remote_port: String,
}

impl Link {
    pub(crate) fn new(local: &str, remote_address: &str, remote_port: &str) -> Self {
        Self {
            local: local.to_string(),
            remote_address: Some(remote_address.to_string()),
            remote_port: remote_port.to_string(),
        }
    }

    /// A neighbor that advertises no management address.
    pub(crate) fn anonymous(local: &str, remote_port: &str) -> Self {
        Self {
            local: local.to_string(),
            remote_address: None,
            remote_port: remote_port.to_string(),
        }
    }
}

/// A Kontron switch that accepts admin/admin.
pub(crate) fn kontron(name: &str, links: &[Link]) -> FakeSwitch {
    let version = format!(
        "MAC Address      : 00-01-c1-00-00-01\n\
         System Name      : {name}\n\
         System Uptime    : 0d 01:00:00\n\
         Product          : Kontron KSwitch D10 MMT\n\
         Software Version : KSwitch (Microchip iStaX) 2022.03\n"
    );

    let mut ports = String::from("Interface             Mode     Speed & Duplex  Link\n");
    let mut lldp = String::new();
    for link in links {
        ports.push_str(&format!("{}   enabled  Auto            1Gfdx\n", link.local));
        lldp.push_str(&format!(
            "Local Interface    : {}\n\
             Chassis ID         : 00-01-c1-00-00-99\n\
             Port ID            : 00-01-c1-00-00-98\n\
             Port Description   : {}\n\
             System Name        : peer\n\
             System Description : Kontron KSwitch\n",
            link.local, link.remote_port
        ));
        if let Some(address) = &link.remote_address {
            lldp.push_str(&format!("Management Address : {} (IPv4)\n", address));
        }
        lldp.push('\n');
    }
    ports.push_str("GigabitEthernet 1/8   enabled  Auto            Down\n");
    if links.is_empty() {
        lldp.push_str("No entries found\n");
    }

    FakeSwitch::new("admin", "admin")
        .reply("show version", version)
        .reply("show interface * status", ports)
        .reply("show lldp neighbors", lldp)
        .reply(
            "show mac address-table",
            "Type     VID  MAC Address        Ports\n\
             Dynamic  1    00-01-c1-00-00-02  GigabitEthernet 1/1\n",
        )
}

/// A Hirschmann switch that accepts admin/private.
pub(crate) fn hirschmann(name: &str, links: &[Link]) -> FakeSwitch {
    let info = format!(
        "System Description.......................Hirschmann BOBCAT - SW: HiOS-3S-08.0.00\n\
         System name..............................{name}\n\
         Firmware software release (RAM)..........HiOS-3S-08.0.00\n\
         MAC address (management).................ec:e5:55:00:00:01\n"
    );

    let mut ports = String::from("Interface  Mode    Phys  Link\n");
    let mut lldp = String::new();
    for (i, link) in links.iter().enumerate() {
        ports.push_str(&format!("{}        enable  auto  up\n", link.local));
        lldp.push_str(&format!(
            "Remote data, {} - #{}\n\
             Chassis ID............................ec:e5:55:00:00:99\n\
             Port ID...............................{}\n\
             System name...........................peer\n\
             System description....................Hirschmann BOBCAT\n",
            link.local,
            i + 1,
            link.remote_port
        ));
        if let Some(address) = &link.remote_address {
            lldp.push_str(&format!("IPv4 Management address...............{}\n", address));
        }
    }
    ports.push_str("1/8        enable  auto  down\n");

    FakeSwitch::new("admin", "private")
        .reply("show system info", info)
        .reply("show port all", ports)
        .reply("show lldp remote-data", lldp)
        .reply(
            "show mac-addr-table",
            "VLAN ID  MAC address        Interface  Status\n\
             1        ec:e5:55:00:00:02  1/1        learned\n",
        )
}

/// Event sink that keeps everything it is given.
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<DiscoveryEvent>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<DiscoveryEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, predicate: impl Fn(&DiscoveryEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &DiscoveryEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
