//! Recursive topology discovery.
//!
//! [`Discovery`] walks the network from a seed address: every address is
//! probed for its vendor, collected, and its LLDP neighbors are fed back as
//! new addresses until nothing new turns up. The result is a
//! [`TopologyGraph`] in which every failure is recorded against the address
//! it happened to.

mod engine;
mod graph;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub use engine::{Discovery, DiscoveryBuilder, DiscoveryOptions};
pub use graph::{Edge, Endpoint, Node, Placeholder, TopologyGraph, UnreachableReason};

/// Per-address discovery state.
///
/// `Pending -> Probing -> Collecting -> Done`, or `Probing -> Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Queued, not yet claimed by a worker.
    Pending,
    Probing,
    Collecting,
    Done,
    /// No vendor detected.
    Failed,
}

impl NodeState {
    /// Whether the address has been claimed for probing.
    pub fn is_visited(&self) -> bool {
        !matches!(self, NodeState::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeState::Done | NodeState::Failed)
    }
}

/// Seconds since the Unix epoch.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
