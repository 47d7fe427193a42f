//! Discovery engine: frontier, workers and graph assembly.

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::graph::{Edge, Endpoint, Node, Placeholder, TopologyGraph, UnreachableReason};
use super::{NodeState, unix_now};
use crate::collect::collect_all;
use crate::credentials::CredentialTable;
use crate::error::{DiscoveryError, Result};
use crate::events::{DiscoveryEvent, EventSink, LogSink};
use crate::model::NodeRecord;
use crate::platform::{PlatformRegistry, vendors};
use crate::probe::{Detection, VendorProbe};
use crate::session::{Connector, Session};

/// Tunables for a discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Addresses probed concurrently.
    pub workers: usize,

    /// Neighbors further than this many hops from the seed are recorded but
    /// not probed. `None` walks the whole reachable network.
    pub max_depth: Option<usize>,

    /// Budget for each capability command on a detected switch.
    pub collection_timeout: Duration,

    /// Budget for the identification command during detection.
    pub identify_timeout: Duration,

    /// Stop dispatching new probes after this long.
    pub deadline: Option<Duration>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            workers: 8,
            max_depth: None,
            collection_timeout: Duration::from_secs(30),
            identify_timeout: Duration::from_secs(5),
            deadline: None,
        }
    }
}

/// Builder for [`Discovery`].
///
/// # Example
///
/// ```rust,no_run
/// use topowalk::credentials::CredentialTable;
/// use topowalk::session::SshConnector;
/// use topowalk::topology::Discovery;
///
/// # async fn example() -> Result<(), topowalk::Error> {
/// let credentials = CredentialTable::load("credentials.yaml")?;
/// let discovery = Discovery::builder(SshConnector::new(), credentials)
///     .workers(4)
///     .max_depth(5)
///     .build();
///
/// let graph = discovery.run("10.0.0.1").await?;
/// println!("{} switches", graph.discovered().count());
/// # Ok(())
/// # }
/// ```
pub struct DiscoveryBuilder<C: Connector> {
    connector: C,
    credentials: CredentialTable,
    platforms: Option<PlatformRegistry>,
    sink: Option<Arc<dyn EventSink>>,
    options: DiscoveryOptions,
}

impl<C: Connector> DiscoveryBuilder<C> {
    pub fn new(connector: C, credentials: CredentialTable) -> Self {
        Self {
            connector,
            credentials,
            platforms: None,
            sink: None,
            options: DiscoveryOptions::default(),
        }
    }

    /// Use custom platform definitions instead of the built-in ones.
    pub fn platforms(mut self, platforms: PlatformRegistry) -> Self {
        self.platforms = Some(platforms);
        self
    }

    /// Where discovery events go (default: [`LogSink`]).
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn options(mut self, options: DiscoveryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.options.workers = workers;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = Some(max_depth);
        self
    }

    pub fn collection_timeout(mut self, timeout: Duration) -> Self {
        self.options.collection_timeout = timeout;
        self
    }

    pub fn identify_timeout(mut self, timeout: Duration) -> Self {
        self.options.identify_timeout = timeout;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.options.deadline = Some(deadline);
        self
    }

    pub fn build(self) -> Discovery<C> {
        Discovery {
            connector: Arc::new(self.connector),
            credentials: Arc::new(self.credentials),
            platforms: Arc::new(self.platforms.unwrap_or_else(PlatformRegistry::builtin)),
            sink: self.sink.unwrap_or_else(|| Arc::new(LogSink)),
            options: self.options,
        }
    }
}

/// A configured discovery, ready to run from any seed.
pub struct Discovery<C: Connector> {
    connector: Arc<C>,
    credentials: Arc<CredentialTable>,
    platforms: Arc<PlatformRegistry>,
    sink: Arc<dyn EventSink>,
    options: DiscoveryOptions,
}

impl<C: Connector> Discovery<C> {
    pub fn builder(connector: C, credentials: CredentialTable) -> DiscoveryBuilder<C> {
        DiscoveryBuilder::new(connector, credentials)
    }

    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    /// Discover everything reachable from `seed`.
    ///
    /// Fails only for an invalid seed or an empty credential table; every
    /// per-switch failure ends up in the returned graph.
    pub async fn run(&self, seed: &str) -> Result<TopologyGraph> {
        self.run_with_cancel(seed, CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), but stops dispatching new probes once
    /// `cancel` fires. Probes already in flight run to completion and the
    /// graph collected so far is returned.
    pub async fn run_with_cancel(
        &self,
        seed: &str,
        cancel: CancellationToken,
    ) -> Result<TopologyGraph> {
        let seed: IpAddr = seed.trim().parse().map_err(|_| DiscoveryError::InvalidSeed {
            seed: seed.to_string(),
        })?;
        if self.credentials.is_empty() {
            return Err(DiscoveryError::EmptyCredentials.into());
        }

        info!(
            "starting discovery from {} ({} workers, max depth {})",
            seed,
            self.options.workers,
            self.options
                .max_depth
                .map_or_else(|| "unlimited".to_string(), |d| d.to_string())
        );

        let ctx = Arc::new(RunContext {
            connector: self.connector.clone(),
            credentials: self.credentials.clone(),
            platforms: self.platforms.clone(),
            sink: self.sink.clone(),
            options: self.options.clone(),
            frontier: Mutex::new(VecDeque::new()),
            states: Mutex::new(HashMap::new()),
            depth_limited: Mutex::new(HashSet::new()),
            graph: Mutex::new(TopologyGraph::new(seed, unix_now())),
        });
        ctx.enqueue(seed, 0);

        let token = cancel.child_token();
        let timer = self.options.deadline.map(|deadline| {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                info!("discovery deadline of {:?} reached", deadline);
                token.cancel();
            })
        });

        let limit = self.options.workers.max(1);
        let mut workers = JoinSet::new();
        let mut cancel_seen = false;
        let mut level = 0;

        // One depth level at a time: an address is first reached over a
        // shortest path for any worker count.
        loop {
            while !token.is_cancelled() && workers.len() < limit {
                let Some(item) = ctx.next(level) else {
                    break;
                };
                if !ctx.claim(&item) {
                    continue;
                }
                workers.spawn(visit(ctx.clone(), item));
            }

            if workers.is_empty() {
                match ctx.next_level() {
                    Some(depth) if !token.is_cancelled() => {
                        debug!("depth {} done, moving to depth {}", level, depth);
                        level = depth;
                        continue;
                    }
                    _ => break,
                }
            }

            tokio::select! {
                joined = workers.join_next() => {
                    if let Some(Err(e)) = joined {
                        error!("discovery worker failed: {}", e);
                    }
                }
                _ = token.cancelled(), if !cancel_seen => {
                    cancel_seen = true;
                    info!("discovery cancelled, waiting for {} in-flight probes", workers.len());
                }
            }
        }

        if let Some(timer) = timer {
            timer.abort();
        }

        let graph = ctx.seal(token.is_cancelled());
        self.sink.emit(&DiscoveryEvent::RunFinished {
            discovered: graph.discovered().count(),
            unreachable: graph.unreachable().count(),
            edges: graph.edge_count(),
            cancelled: graph.cancelled,
        });
        Ok(graph)
    }
}

#[derive(Debug, Clone, Copy)]
struct FrontierItem {
    address: IpAddr,
    depth: usize,
}

#[derive(Debug, Clone, Copy)]
struct Tracked {
    state: NodeState,
    depth: usize,
}

/// Shared state of one run.
struct RunContext<C: Connector> {
    connector: Arc<C>,
    credentials: Arc<CredentialTable>,
    platforms: Arc<PlatformRegistry>,
    sink: Arc<dyn EventSink>,
    options: DiscoveryOptions,

    frontier: Mutex<VecDeque<FrontierItem>>,
    states: Mutex<HashMap<IpAddr, Tracked>>,
    /// Neighbors seen only beyond the depth limit.
    depth_limited: Mutex<HashSet<IpAddr>>,
    graph: Mutex<TopologyGraph>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<C: Connector> RunContext<C> {
    /// Queue an address unless it is already known or too deep.
    fn enqueue(&self, address: IpAddr, depth: usize) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            lock(&self.depth_limited).insert(address);
            return;
        }

        let mut states = lock(&self.states);
        if states.contains_key(&address) {
            return;
        }
        states.insert(
            address,
            Tracked {
                state: NodeState::Pending,
                depth,
            },
        );
        lock(&self.frontier).push_back(FrontierItem { address, depth });
    }

    /// Pop the next address at `level`. The frontier is ordered by depth,
    /// so deeper items wait until the level drains.
    fn next(&self, level: usize) -> Option<FrontierItem> {
        let mut frontier = lock(&self.frontier);
        match frontier.front() {
            Some(item) if item.depth <= level => frontier.pop_front(),
            _ => None,
        }
    }

    /// Depth of the shallowest queued address.
    fn next_level(&self) -> Option<usize> {
        lock(&self.frontier).front().map(|item| item.depth)
    }

    /// Claim an address for probing. Returns false if another worker
    /// already has it.
    fn claim(&self, item: &FrontierItem) -> bool {
        {
            let mut states = lock(&self.states);
            match states.get_mut(&item.address) {
                Some(tracked) if tracked.state.is_visited() => return false,
                Some(tracked) => tracked.state = NodeState::Probing,
                None => {
                    states.insert(
                        item.address,
                        Tracked {
                            state: NodeState::Probing,
                            depth: item.depth,
                        },
                    );
                }
            }
        }
        self.sink.emit(&DiscoveryEvent::StateChanged {
            address: item.address,
            state: NodeState::Probing,
        });
        true
    }

    fn set_state(&self, address: IpAddr, state: NodeState) {
        if let Some(tracked) = lock(&self.states).get_mut(&address) {
            tracked.state = state;
        }
        self.sink
            .emit(&DiscoveryEvent::StateChanged { address, state });
    }

    fn record_placeholder(&self, placeholder: Placeholder) {
        let address = placeholder.address;
        let reason = placeholder.reason.clone();
        if lock(&self.graph).insert_node(Node::Unreachable(placeholder)) {
            self.sink
                .emit(&DiscoveryEvent::PlaceholderRecorded { address, reason });
        }
    }

    fn record_node(&self, record: NodeRecord) {
        let event = DiscoveryEvent::NodeCollected {
            address: record.address,
            vendor: record.vendor,
            missing: record.missing_capabilities(),
        };
        if lock(&self.graph).insert_node(Node::Discovered(record)) {
            self.sink.emit(&event);
        }
    }

    /// Add edges for every neighbor with a management address and queue the
    /// neighbors.
    fn follow_neighbors(&self, record: &NodeRecord) {
        for neighbor in record.neighbors() {
            let Some(remote) = neighbor.remote_management_address else {
                continue;
            };
            if remote == record.address {
                continue;
            }

            let edge = Edge::new(
                Endpoint::new(record.address, neighbor.local_interface.clone()),
                Endpoint::new(remote, neighbor.remote_interface.clone()),
            );
            if lock(&self.graph).insert_edge(edge) {
                self.sink.emit(&DiscoveryEvent::EdgeDiscovered {
                    a: record.address,
                    a_interface: neighbor.local_interface.clone(),
                    b: remote,
                    b_interface: neighbor.remote_interface.clone(),
                });
            }

            self.enqueue(remote, record.depth + 1);
        }
    }

    /// Finish the graph: every known address without a node gets a
    /// placeholder.
    fn seal(&self, cancelled: bool) -> TopologyGraph {
        let states = lock(&self.states).clone();
        let left: Vec<FrontierItem> = lock(&self.frontier).drain(..).collect();
        let depth_limited = lock(&self.depth_limited).clone();

        let mut recorded = Vec::new();
        let mut graph = lock(&self.graph);

        for (address, tracked) in &states {
            if tracked.state.is_visited() && !graph.contains(*address) {
                warn!("{}: probe never finished ({:?})", address, tracked.state);
                recorded.push(Placeholder {
                    address: *address,
                    depth: tracked.depth,
                    reason: UnreachableReason::Interrupted,
                });
            }
        }

        for item in left {
            recorded.push(Placeholder {
                address: item.address,
                depth: item.depth,
                reason: UnreachableReason::NotVisited,
            });
        }

        for address in graph.dangling() {
            let depth = graph
                .edges()
                .filter(|edge| edge.touches(address))
                .flat_map(Edge::addresses)
                .filter(|other| *other != address)
                .filter_map(|other| graph.node(other))
                .map(|node| node.depth() + 1)
                .min()
                .unwrap_or(0);
            let reason = match self.options.max_depth {
                Some(max_depth) if depth_limited.contains(&address) => {
                    UnreachableReason::DepthLimit { max_depth }
                }
                _ => UnreachableReason::NotVisited,
            };
            recorded.push(Placeholder {
                address,
                depth,
                reason,
            });
        }

        let mut events = Vec::new();
        for placeholder in recorded {
            let address = placeholder.address;
            let reason = placeholder.reason.clone();
            if graph.insert_node(Node::Unreachable(placeholder)) {
                events.push(DiscoveryEvent::PlaceholderRecorded { address, reason });
            }
        }

        graph.cancelled = cancelled;
        graph.finished_at = Some(unix_now());
        let empty = TopologyGraph::new(graph.seed, graph.started_at);
        let sealed = std::mem::replace(&mut *graph, empty);
        drop(graph);

        for event in &events {
            self.sink.emit(event);
        }
        debug!(
            "sealed graph: {} nodes, {} edges",
            sealed.node_count(),
            sealed.edge_count()
        );
        sealed
    }
}

/// Probe, collect and expand one address.
async fn visit<C: Connector>(ctx: Arc<RunContext<C>>, item: FrontierItem) {
    let FrontierItem { address, depth } = item;
    ctx.sink
        .emit(&DiscoveryEvent::ProbeStarted { address, depth });

    let probe = VendorProbe::new(
        ctx.connector.as_ref(),
        ctx.credentials.as_ref(),
        ctx.platforms.as_ref(),
        ctx.sink.as_ref(),
        ctx.options.identify_timeout,
    );

    let Detection {
        vendor,
        credential,
        mut session,
    } = match probe.detect(address).await {
        Ok(detection) => detection,
        Err(failure) => {
            debug!("{}", failure);
            ctx.set_state(address, NodeState::Failed);
            ctx.record_placeholder(Placeholder {
                address,
                depth,
                reason: UnreachableReason::DetectionFailed {
                    attempted: failure.attempted,
                },
            });
            return;
        }
    };

    let Some(collector) = vendors::collector(vendor) else {
        warn!("{}: no collector for {}", address, vendor);
        if let Err(e) = session.close().await {
            debug!("{}: error closing session: {}", address, e);
        }
        ctx.set_state(address, NodeState::Failed);
        ctx.record_placeholder(Placeholder {
            address,
            depth,
            reason: UnreachableReason::DetectionFailed {
                attempted: vec![vendor],
            },
        });
        return;
    };

    ctx.set_state(address, NodeState::Collecting);
    let collection = collect_all(collector, &mut session, ctx.options.collection_timeout).await;
    if let Err(e) = session.close().await {
        debug!("{}: error closing session: {}", address, e);
    }

    let record = NodeRecord {
        address,
        vendor,
        username: credential.username,
        depth,
        collected_at: unix_now(),
        system: collection.system,
        interfaces: collection.interfaces,
        lldp_neighbors: collection.lldp_neighbors,
        mac_table: collection.mac_table,
    };
    ctx.follow_neighbors(&record);
    ctx.record_node(record);
    ctx.set_state(address, NodeState::Done);
}
