//! Vendor collectors: the uniform capability set run on a detected switch.
//!
//! Every vendor implements [`Collector`] with its own command strings and
//! parsers, and all of them produce the shapes in [`crate::model`]. A
//! capability that fails only degrades its own field of the node record.

pub mod parse;

use std::time::Duration;

use log::debug;

use crate::error::{CollectError, ParseError};
use crate::model::{
    Capability, Field, Interface, LldpNeighbor, MacEntry, Missing, MissingKind, SystemInfo, Vendor,
};
use crate::session::Session;

/// The command a vendor runs for each capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSet {
    pub system_info: &'static str,
    pub interfaces: &'static str,
    pub lldp_neighbors: &'static str,
    pub mac_table: &'static str,
}

impl CommandSet {
    pub fn command(&self, capability: Capability) -> &'static str {
        match capability {
            Capability::SystemInfo => self.system_info,
            Capability::Interfaces => self.interfaces,
            Capability::LldpNeighbors => self.lldp_neighbors,
            Capability::MacTable => self.mac_table,
        }
    }
}

/// Vendor-specific commands and parsers.
pub trait Collector: Send + Sync {
    fn vendor(&self) -> Vendor;

    fn commands(&self) -> &CommandSet;

    fn parse_system_info(&self, output: &str) -> Result<SystemInfo, ParseError>;

    fn parse_interfaces(&self, output: &str) -> Result<Vec<Interface>, ParseError>;

    fn parse_lldp_neighbors(&self, output: &str) -> Result<Vec<LldpNeighbor>, ParseError>;

    fn parse_mac_table(&self, output: &str) -> Result<Vec<MacEntry>, ParseError>;
}

/// Run a capability's command and return its output.
///
/// A vendor error string in the output counts as a failed command.
async fn run<S: Session>(
    session: &mut S,
    collector: &dyn Collector,
    capability: Capability,
    timeout: Duration,
) -> Result<String, CollectError> {
    let command = collector.commands().command(capability);

    match tokio::time::timeout(timeout, session.send_command(command, timeout)).await {
        Err(_) => Err(CollectError::Timeout {
            capability,
            after: timeout,
        }),
        Ok(Err(e)) if e.is_timeout() => Err(CollectError::Timeout {
            capability,
            after: timeout,
        }),
        Ok(Err(e)) => Err(CollectError::Command {
            capability,
            message: e.to_string(),
        }),
        Ok(Ok(response)) => match response.failure_message {
            Some(message) => Err(CollectError::Command {
                capability,
                message,
            }),
            None => Ok(response.result),
        },
    }
}

pub async fn get_system_info<S: Session>(
    collector: &dyn Collector,
    session: &mut S,
    timeout: Duration,
) -> Result<SystemInfo, CollectError> {
    let output = run(session, collector, Capability::SystemInfo, timeout).await?;
    Ok(collector.parse_system_info(&output)?)
}

pub async fn get_interfaces<S: Session>(
    collector: &dyn Collector,
    session: &mut S,
    timeout: Duration,
) -> Result<Vec<Interface>, CollectError> {
    let output = run(session, collector, Capability::Interfaces, timeout).await?;
    Ok(collector.parse_interfaces(&output)?)
}

pub async fn get_lldp_neighbors<S: Session>(
    collector: &dyn Collector,
    session: &mut S,
    timeout: Duration,
) -> Result<Vec<LldpNeighbor>, CollectError> {
    let output = run(session, collector, Capability::LldpNeighbors, timeout).await?;
    Ok(collector.parse_lldp_neighbors(&output)?)
}

pub async fn get_mac_table<S: Session>(
    collector: &dyn Collector,
    session: &mut S,
    timeout: Duration,
) -> Result<Vec<MacEntry>, CollectError> {
    let output = run(session, collector, Capability::MacTable, timeout).await?;
    Ok(collector.parse_mac_table(&output)?)
}

/// The four capability results for one switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub system: Field<SystemInfo>,
    pub interfaces: Field<Vec<Interface>>,
    pub lldp_neighbors: Field<Vec<LldpNeighbor>>,
    pub mac_table: Field<Vec<MacEntry>>,
}

/// Run every capability in turn. Never fails as a whole.
pub async fn collect_all<S: Session>(
    collector: &dyn Collector,
    session: &mut S,
    timeout: Duration,
) -> Collection {
    Collection {
        system: into_field(get_system_info(collector, session, timeout).await),
        interfaces: into_field(get_interfaces(collector, session, timeout).await),
        lldp_neighbors: into_field(get_lldp_neighbors(collector, session, timeout).await),
        mac_table: into_field(get_mac_table(collector, session, timeout).await),
    }
}

fn into_field<T>(result: Result<T, CollectError>) -> Field<T> {
    match result {
        Ok(value) => Field::Collected { value },
        Err(e) => {
            debug!("{}", e);
            let kind = match &e {
                CollectError::Parse(_) => MissingKind::Parse,
                CollectError::Timeout { .. } => MissingKind::Timeout,
                CollectError::Command { .. } => MissingKind::Command,
            };
            Field::Missing {
                missing: Missing {
                    kind,
                    message: e.to_string(),
                },
            }
        }
    }
}
