//! The topology graph produced by a discovery run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::model::{NodeRecord, Vendor};

/// One side of a link: a switch address and, when known, its port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: IpAddr,
    pub interface: Option<String>,
}

impl Endpoint {
    pub fn new(address: IpAddr, interface: Option<String>) -> Self {
        Self { address, interface }
    }

    /// Whether two endpoints can describe the same port.
    ///
    /// An unknown interface is compatible with any interface on the same
    /// address.
    fn agrees_with(&self, other: &Endpoint) -> bool {
        self.address == other.address
            && match (&self.interface, &other.interface) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.interface {
            Some(interface) => write!(f, "{} [{}]", self.address, interface),
            None => write!(f, "{}", self.address),
        }
    }
}

/// An undirected link between two switches.
///
/// Endpoints are stored in sorted order, so the link reported from either
/// side compares equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub a: Endpoint,
    pub b: Endpoint,
}

impl Edge {
    pub fn new(x: Endpoint, y: Endpoint) -> Self {
        if x <= y { Self { a: x, b: y } } else { Self { a: y, b: x } }
    }

    pub fn addresses(&self) -> [IpAddr; 2] {
        [self.a.address, self.b.address]
    }

    pub fn touches(&self, address: IpAddr) -> bool {
        self.a.address == address || self.b.address == address
    }

    fn same_link(&self, other: &Edge) -> bool {
        (self.a.agrees_with(&other.a) && self.b.agrees_with(&other.b))
            || (self.a.agrees_with(&other.b) && self.b.agrees_with(&other.a))
    }
}

/// Why an address has no node record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnreachableReason {
    /// Probed, but no vendor/credential combination worked.
    DetectionFailed { attempted: Vec<Vendor> },

    /// Seen as a neighbor beyond the maximum discovery depth.
    DepthLimit { max_depth: usize },

    /// Known but never probed because the run was cancelled.
    NotVisited,

    /// Probing started but never finished.
    Interrupted,
}

impl fmt::Display for UnreachableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnreachableReason::DetectionFailed { attempted } if attempted.is_empty() => {
                write!(f, "detection failed, no vendor attempted")
            }
            UnreachableReason::DetectionFailed { attempted } => {
                let names: Vec<&str> = attempted.iter().map(|v| v.as_str()).collect();
                write!(f, "detection failed (tried {})", names.join(", "))
            }
            UnreachableReason::DepthLimit { max_depth } => {
                write!(f, "beyond maximum depth {}", max_depth)
            }
            UnreachableReason::NotVisited => write!(f, "not visited"),
            UnreachableReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Terminal node for an address that was seen but never collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub address: IpAddr,
    pub depth: usize,
    #[serde(flatten)]
    pub reason: UnreachableReason,
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Node {
    Discovered(NodeRecord),
    Unreachable(Placeholder),
}

impl Node {
    pub fn address(&self) -> IpAddr {
        match self {
            Node::Discovered(record) => record.address,
            Node::Unreachable(placeholder) => placeholder.address,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Node::Discovered(record) => record.depth,
            Node::Unreachable(placeholder) => placeholder.depth,
        }
    }

    pub fn as_record(&self) -> Option<&NodeRecord> {
        match self {
            Node::Discovered(record) => Some(record),
            Node::Unreachable(_) => None,
        }
    }

    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Node::Discovered(_) => None,
            Node::Unreachable(placeholder) => Some(placeholder),
        }
    }
}

/// Switches and the links between them.
///
/// Append-only: nodes and edges are never replaced or removed once inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyGraph {
    pub seed: IpAddr,

    /// Seconds since the Unix epoch.
    pub started_at: u64,
    pub finished_at: Option<u64>,

    /// Whether the run was cut short by cancellation or its deadline.
    pub cancelled: bool,

    nodes: BTreeMap<IpAddr, Node>,
    edges: BTreeSet<Edge>,
}

impl TopologyGraph {
    pub fn new(seed: IpAddr, started_at: u64) -> Self {
        Self {
            seed,
            started_at,
            finished_at: None,
            cancelled: false,
            nodes: BTreeMap::new(),
            edges: BTreeSet::new(),
        }
    }

    /// Insert a node unless its address already has one.
    pub fn insert_node(&mut self, node: Node) -> bool {
        let address = node.address();
        if self.nodes.contains_key(&address) {
            return false;
        }
        self.nodes.insert(address, node);
        true
    }

    /// Insert an edge unless the same link is already present.
    ///
    /// Self-links are rejected. A link already known with one side's
    /// interface unknown counts as the same link.
    pub fn insert_edge(&mut self, edge: Edge) -> bool {
        if edge.a.address == edge.b.address {
            return false;
        }
        if self.edges.iter().any(|existing| existing.same_link(&edge)) {
            return false;
        }
        self.edges.insert(edge)
    }

    pub fn node(&self, address: IpAddr) -> Option<&Node> {
        self.nodes.get(&address)
    }

    pub fn contains(&self, address: IpAddr) -> bool {
        self.nodes.contains_key(&address)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Records of every switch that was logged into.
    pub fn discovered(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.values().filter_map(Node::as_record)
    }

    pub fn unreachable(&self) -> impl Iterator<Item = &Placeholder> {
        self.nodes.values().filter_map(Node::as_placeholder)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Deepest node depth, or 0 for an empty graph.
    pub fn max_depth(&self) -> usize {
        self.nodes.values().map(Node::depth).max().unwrap_or(0)
    }

    /// Edge endpoints that have no node.
    pub fn dangling(&self) -> BTreeSet<IpAddr> {
        self.edges
            .iter()
            .flat_map(Edge::addresses)
            .filter(|address| !self.nodes.contains_key(address))
            .collect()
    }

    /// Whether every edge endpoint has a node.
    pub fn is_consistent(&self) -> bool {
        self.dangling().is_empty()
    }
}
