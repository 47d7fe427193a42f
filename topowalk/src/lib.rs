//! # Topowalk
//!
//! Multi-vendor switch topology discovery over SSH.
//!
//! Starting from one seed address, topowalk logs into each switch, works out
//! who made it, reads its identity, ports, MAC table and LLDP neighbors, and
//! follows those neighbors until the reachable network is mapped.
//!
//! ## Features
//!
//! - Async SSH sessions via russh, with scrapli-style tail prompt matching
//! - Vendor detection by trial login (Hirschmann, Lantech, Kontron, Nomad)
//! - Concurrent, cycle-safe traversal with a bounded worker pool
//! - Partial records instead of dropped switches when a command fails
//! - Unreachable neighbors kept in the graph with the reason
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use topowalk::{CredentialTable, Discovery, Inventory, SshConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), topowalk::Error> {
//!     let credentials = CredentialTable::load("credentials.yaml")?;
//!     let discovery = Discovery::builder(SshConnector::new(), credentials)
//!         .max_depth(5)
//!         .build();
//!
//!     let graph = discovery.run("192.168.1.31").await?;
//!     for record in graph.discovered() {
//!         println!("{} {}", record.address, record.hostname().unwrap_or("?"));
//!     }
//!
//!     let inventory = Inventory::from_graph(&graph);
//!     println!("{} switches", inventory.total_switches_discovered);
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod collect;
pub mod credentials;
pub mod error;
pub mod events;
pub mod inventory;
pub mod model;
pub mod platform;
pub mod probe;
pub mod session;
pub mod topology;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use credentials::{Credential, CredentialTable, SessionSettings};
pub use error::{Error, Result};
pub use events::{DiscoveryEvent, EventSink, LogSink};
pub use inventory::Inventory;
pub use model::{NodeRecord, Vendor};
pub use session::{Connector, Session, SshConnector};
pub use topology::{Discovery, DiscoveryOptions, TopologyGraph};
