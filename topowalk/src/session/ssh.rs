//! SSH-backed sessions.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use super::{Connector, RemoteTarget, Response, Session};
use crate::channel::{PtyChannel, compile_prompt_pattern};
use crate::credentials::Credential;
use crate::error::{ChannelError, Error, Result, SessionError};
use crate::platform::PlatformDefinition;
use crate::transport::{SshConfig, SshTransport};

/// Any line ending in a CLI prompt character. Only used for the first
/// prompt after login, before the vendor is known.
static LOGIN_PROMPT: Lazy<Regex> =
    Lazy::new(|| compile_prompt_pattern(r"(?:^|\n)[^\n]{0,80}[>#$%]").unwrap());

/// Opens SSH sessions with password authentication and a PTY shell.
#[derive(Debug, Clone)]
pub struct SshConnector {
    search_depth: usize,
}

impl SshConnector {
    pub fn new() -> Self {
        Self { search_depth: 1000 }
    }

    /// How many trailing bytes are searched for prompts.
    pub fn with_search_depth(mut self, depth: usize) -> Self {
        self.search_depth = depth;
        self
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for SshConnector {
    type Session = SshSession;

    async fn connect(
        &self,
        target: &RemoteTarget,
        credential: &Credential,
        platform: &PlatformDefinition,
    ) -> Result<SshSession> {
        let config = SshConfig {
            host: target.address.to_string(),
            port: target.port,
            username: credential.username.clone(),
            password: credential.secret.clone(),
            timeout: target.timeout,
            terminal_width: platform.terminal_width,
            terminal_height: platform.terminal_height,
            host_key_verification: target.host_key_verification.clone(),
            known_hosts_path: target.known_hosts_path.clone(),
        };

        let transport = SshTransport::connect(config).await?;
        let shell = match transport.open_shell().await {
            Ok(shell) => shell,
            Err(e) => {
                if let Err(close_err) = transport.close().await {
                    debug!("{}: close after failed shell: {}", target.address, close_err);
                }
                return Err(e);
            }
        };

        let mut session = SshSession {
            host: target.address,
            transport: Some(transport),
            channel: Some(PtyChannel::new(shell, self.search_depth)),
            platform: platform.clone(),
            timeout: target.timeout,
        };

        match session.open().await {
            Ok(()) => Ok(session),
            Err(e) => {
                if let Err(close_err) = session.shutdown().await {
                    debug!("{}: close after failed open: {}", target.address, close_err);
                }
                Err(e)
            }
        }
    }
}

/// Interactive CLI session over SSH.
pub struct SshSession {
    host: IpAddr,
    transport: Option<SshTransport>,
    channel: Option<PtyChannel>,
    platform: PlatformDefinition,
    timeout: Duration,
}

impl SshSession {
    /// Wait for the login prompt and run the platform's on-open commands.
    async fn open(&mut self) -> Result<()> {
        let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;
        channel
            .read_until_prompt(&LOGIN_PROMPT, self.platform.pager.as_ref(), self.timeout)
            .await?;

        for command in self.platform.on_open_commands.clone() {
            let response = self.execute(&command, self.timeout).await?;
            if !response.is_success() {
                debug!(
                    "{}: on-open command '{}' rejected: {:?}",
                    self.host, command, response.failure_message
                );
            }
        }
        Ok(())
    }

    async fn execute(&mut self, command: &str, timeout: Duration) -> Result<Response> {
        let started = Instant::now();
        let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;

        channel.clear_buffer();
        channel.send(command).await?;

        let raw = match channel
            .read_until_prompt(&self.platform.prompt, self.platform.pager.as_ref(), timeout)
            .await
        {
            Ok(raw) => raw,
            Err(Error::Channel(ChannelError::PatternTimeout(_))) => {
                return Err(SessionError::CommandTimeout {
                    command: command.to_string(),
                    after: timeout,
                }
                .into());
            }
            Err(e) => return Err(e),
        };

        let raw = String::from_utf8_lossy(&raw).into_owned();
        let prompt = raw.lines().last().unwrap_or_default().trim().to_string();
        let result = self.platform.normalize_output(&raw, command);
        let elapsed = started.elapsed();
        trace!("{}: '{}' returned {} bytes in {:?}", self.host, command, raw.len(), elapsed);

        let response = Response::new(command, result, raw, prompt, elapsed);
        Ok(match self.platform.detect_failure(&response.result) {
            Some(failure) => response.with_failure(failure),
            None => response,
        })
    }

    async fn shutdown(&mut self) -> Result<()> {
        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                debug!("{}: channel close: {}", self.host, e);
            }
        }
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }
}

impl Session for SshSession {
    async fn send_command(&mut self, command: &str, timeout: Duration) -> Result<Response> {
        self.execute(command, timeout).await
    }

    async fn close(mut self) -> Result<()> {
        self.shutdown().await
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if self.transport.is_some() {
            warn!("session to {} dropped without close()", self.host);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_prompt() {
        assert!(LOGIN_PROMPT.is_match(b"Welcome\n(BOBCAT) >"));
        assert!(LOGIN_PROMPT.is_match(b"banner\nEthernetSwitch# "));
        assert!(!LOGIN_PROMPT.is_match(b"Last login: yesterday\n"));
    }
}
