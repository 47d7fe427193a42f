//! Normalized, vendor-independent data model.
//!
//! Every vendor collector produces these shapes, whatever its CLI looks like.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported switch vendors.
///
/// The declaration order is the probe order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    Hirschmann,
    Lantech,
    Kontron,
    Nomad,
    /// Not one of the supported vendors (used for neighbor hints).
    #[default]
    Unknown,
}

impl Vendor {
    /// Supported vendors in probe order.
    pub const ALL: [Vendor; 4] = [
        Vendor::Hirschmann,
        Vendor::Lantech,
        Vendor::Kontron,
        Vendor::Nomad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Hirschmann => "hirschmann",
            Vendor::Lantech => "lantech",
            Vendor::Kontron => "kontron",
            Vendor::Nomad => "nomad",
            Vendor::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hirschmann" => Ok(Vendor::Hirschmann),
            "lantech" => Ok(Vendor::Lantech),
            "kontron" => Ok(Vendor::Kontron),
            "nomad" => Ok(Vendor::Nomad),
            other => Err(other.to_string()),
        }
    }
}

/// The four data-collection capabilities every vendor collector exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    SystemInfo,
    Interfaces,
    LldpNeighbors,
    MacTable,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::SystemInfo,
        Capability::Interfaces,
        Capability::LldpNeighbors,
        Capability::MacTable,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::SystemInfo => "system info",
            Capability::Interfaces => "interfaces",
            Capability::LldpNeighbors => "lldp neighbors",
            Capability::MacTable => "mac table",
        };
        f.write_str(name)
    }
}

/// System identity of a switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub hostname: Option<String>,
    pub model: Option<String>,
    pub os_version: Option<String>,
    pub serial_number: Option<String>,
    pub uptime: Option<String>,
    pub location: Option<String>,
    pub contact: Option<String>,
    pub description: Option<String>,
    /// Management address as reported by the switch itself.
    pub management_address: Option<IpAddr>,
    /// Management MAC, normalized to lowercase colon form.
    pub management_mac: Option<String>,
}

/// Link state of a switch port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Up,
    Down,
    Disabled,
    Unknown,
}

/// One switch port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub link: LinkState,
    pub speed: Option<String>,
}

/// One learned MAC address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacEntry {
    /// Normalized to lowercase colon form.
    pub mac: String,
    pub vlan: Option<u16>,
    pub interface: String,
}

/// One row of a switch's LLDP neighbor table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LldpNeighbor {
    /// Absent when the listing does not name the local port.
    pub local_interface: Option<String>,
    pub remote_interface: Option<String>,
    pub remote_system_name: Option<String>,
    /// Absent when the neighbor does not advertise one; such neighbors add
    /// no edge and are not probed.
    pub remote_management_address: Option<IpAddr>,
    pub remote_chassis_id: Option<String>,
    /// Vendor guessed from the advertised system description.
    pub remote_vendor: Vendor,
}

/// Why a node record field is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingKind {
    Parse,
    Timeout,
    Command,
}

/// Explicit marker for a capability that could not be collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Missing {
    pub kind: MissingKind,
    pub message: String,
}

/// A node record field: either collected, or explicitly missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Field<T> {
    Collected { value: T },
    Missing { missing: Missing },
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Collected { value } => Some(value),
            Field::Missing { .. } => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing { .. })
    }

    pub fn missing(&self) -> Option<&Missing> {
        match self {
            Field::Collected { .. } => None,
            Field::Missing { missing } => Some(missing),
        }
    }
}

/// Normalized description of one successfully identified switch.
///
/// Built once per host and never modified after it is inserted into the
/// topology graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Address the switch was probed and logged into at.
    pub address: IpAddr,
    pub vendor: Vendor,
    /// Username of the credential that succeeded.
    pub username: String,
    /// Hops from the seed.
    pub depth: usize,
    /// Seconds since the Unix epoch at which collection finished.
    pub collected_at: u64,
    pub system: Field<SystemInfo>,
    pub interfaces: Field<Vec<Interface>>,
    pub lldp_neighbors: Field<Vec<LldpNeighbor>>,
    pub mac_table: Field<Vec<MacEntry>>,
}

impl NodeRecord {
    fn system(&self) -> Option<&SystemInfo> {
        self.system.value()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.system().and_then(|s| s.hostname.as_deref())
    }

    pub fn model(&self) -> Option<&str> {
        self.system().and_then(|s| s.model.as_deref())
    }

    pub fn os_version(&self) -> Option<&str> {
        self.system().and_then(|s| s.os_version.as_deref())
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.system().and_then(|s| s.serial_number.as_deref())
    }

    pub fn management_mac(&self) -> Option<&str> {
        self.system().and_then(|s| s.management_mac.as_deref())
    }

    /// LLDP neighbors, or an empty slice when they could not be collected.
    pub fn neighbors(&self) -> &[LldpNeighbor] {
        self.lldp_neighbors.value().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Capabilities that are explicitly missing on this record.
    pub fn missing_capabilities(&self) -> Vec<Capability> {
        let mut missing = Vec::new();
        if self.system.is_missing() {
            missing.push(Capability::SystemInfo);
        }
        if self.interfaces.is_missing() {
            missing.push(Capability::Interfaces);
        }
        if self.lldp_neighbors.is_missing() {
            missing.push(Capability::LldpNeighbors);
        }
        if self.mac_table.is_missing() {
            missing.push(Capability::MacTable);
        }
        missing
    }

    /// Whether every capability was collected.
    pub fn is_complete(&self) -> bool {
        self.missing_capabilities().is_empty()
    }
}
