//! Structured discovery events.
//!
//! The engine reports what it does through an [`EventSink`] rather than
//! logging directly, so callers can collect, count or forward events. The
//! default [`LogSink`] renders them through the `log` facade.

use std::net::IpAddr;

use log::{debug, info, warn};

use crate::model::{Capability, Vendor};
use crate::topology::{NodeState, UnreachableReason};

/// Something that happened during a discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// Vendor detection started for an address.
    ProbeStarted { address: IpAddr, depth: usize },

    /// One (vendor, credential) pair is being tried.
    ProbeAttempt {
        address: IpAddr,
        vendor: Vendor,
        username: String,
    },

    /// A (vendor, credential) pair did not work out.
    ProbeFailed {
        address: IpAddr,
        vendor: Vendor,
        username: String,
        reason: String,
    },

    VendorDetected {
        address: IpAddr,
        vendor: Vendor,
        username: String,
    },

    StateChanged { address: IpAddr, state: NodeState },

    /// A node record was inserted into the graph.
    NodeCollected {
        address: IpAddr,
        vendor: Vendor,
        missing: Vec<Capability>,
    },

    EdgeDiscovered {
        a: IpAddr,
        a_interface: Option<String>,
        b: IpAddr,
        b_interface: Option<String>,
    },

    /// An unreachable placeholder was inserted into the graph.
    PlaceholderRecorded {
        address: IpAddr,
        reason: UnreachableReason,
    },

    RunFinished {
        discovered: usize,
        unreachable: usize,
        edges: usize,
        cancelled: bool,
    },
}

/// Receiver of discovery events. Called from worker tasks concurrently.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &DiscoveryEvent);
}

/// Renders events through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &DiscoveryEvent) {
        match event {
            DiscoveryEvent::ProbeStarted { address, depth } => {
                info!("{}: probing (depth {})", address, depth)
            }
            DiscoveryEvent::ProbeAttempt {
                address,
                vendor,
                username,
            } => debug!("{}: trying {} as '{}'", address, vendor, username),
            DiscoveryEvent::ProbeFailed {
                address,
                vendor,
                username,
                reason,
            } => debug!("{}: {} as '{}' failed: {}", address, vendor, username, reason),
            DiscoveryEvent::VendorDetected {
                address,
                vendor,
                username,
            } => info!("{}: detected {} (user '{}')", address, vendor, username),
            DiscoveryEvent::StateChanged { address, state } => {
                debug!("{}: -> {:?}", address, state)
            }
            DiscoveryEvent::NodeCollected {
                address,
                vendor,
                missing,
            } => {
                if missing.is_empty() {
                    info!("{}: collected {} switch", address, vendor);
                } else {
                    let names: Vec<String> = missing.iter().map(|c| c.to_string()).collect();
                    warn!(
                        "{}: collected {} switch, missing {}",
                        address,
                        vendor,
                        names.join(", ")
                    );
                }
            }
            DiscoveryEvent::EdgeDiscovered {
                a,
                a_interface,
                b,
                b_interface,
            } => debug!(
                "edge {} [{}] <-> {} [{}]",
                a,
                a_interface.as_deref().unwrap_or("?"),
                b,
                b_interface.as_deref().unwrap_or("?")
            ),
            DiscoveryEvent::PlaceholderRecorded { address, reason } => {
                warn!("{}: unreachable ({})", address, reason)
            }
            DiscoveryEvent::RunFinished {
                discovered,
                unreachable,
                edges,
                cancelled,
            } => info!(
                "discovery {}: {} switches, {} unreachable, {} links",
                if *cancelled { "cancelled" } else { "finished" },
                discovered,
                unreachable,
                edges
            ),
        }
    }
}
