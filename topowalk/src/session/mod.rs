//! Remote sessions on switches.
//!
//! A session is one authenticated, prompt-synchronized CLI login. The
//! discovery engine only ever sees the [`Connector`] and [`Session`] traits;
//! [`SshConnector`] is the production implementation.

mod response;
mod retry;
mod ssh;

use std::future::Future;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

pub use response::Response;
pub use retry::open_with_retry;
pub use ssh::{SshConnector, SshSession};

use crate::credentials::Credential;
use crate::error::Result;
use crate::platform::PlatformDefinition;
use crate::transport::HostKeyVerification;

/// Where and how to reach one switch.
#[derive(Debug, Clone)]
pub struct RemoteTarget {
    pub address: IpAddr,
    pub port: u16,

    /// Budget for the TCP connect, the SSH handshake and the first prompt.
    pub timeout: Duration,

    /// Extra connection attempts after the first one fails.
    pub retry_attempts: u32,

    /// Pause between connection attempts.
    pub retry_delay: Duration,

    pub host_key_verification: HostKeyVerification,
    pub known_hosts_path: Option<PathBuf>,
}

impl RemoteTarget {
    pub fn new(address: IpAddr) -> Self {
        Self {
            address,
            port: 22,
            timeout: Duration::from_secs(30),
            retry_attempts: 1,
            retry_delay: Duration::from_secs(2),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}

/// An open CLI session on one switch.
///
/// Sessions must be given back with [`Session::close`]; dropping one leaves
/// teardown to the transport.
pub trait Session: Send + Sized {
    /// Run one command and wait for the prompt to return.
    fn send_command(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Log out and release the connection.
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens sessions.
pub trait Connector: Send + Sync + 'static {
    type Session: Session + 'static;

    /// Connect, authenticate with `credential`, and wait for the first prompt
    /// using `platform`'s session settings.
    fn connect(
        &self,
        target: &RemoteTarget,
        credential: &Credential,
        platform: &PlatformDefinition,
    ) -> impl Future<Output = Result<Self::Session>> + Send;
}
