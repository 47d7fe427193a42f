//! Host inventory derived from a topology graph.

use std::net::IpAddr;

use indexmap::IndexMap;
use serde::Serialize;

use crate::topology::TopologyGraph;

const UNKNOWN: &str = "unknown";

/// One discovered switch as an inventory host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryHost {
    pub ansible_host: IpAddr,
    pub vendor: String,
    pub model: String,
    pub hostname: String,
    pub serial_number: String,
    pub os_version: String,
    pub discovery_depth: usize,
    pub neighbor_count: usize,
}

/// An address that was seen but never collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreachableHost {
    pub address: IpAddr,
    pub depth: usize,
    pub reason: String,
}

/// Inventory of a discovery run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inventory {
    /// Keyed by management address, in address order.
    pub hosts: IndexMap<String, InventoryHost>,
    pub unreachable: Vec<UnreachableHost>,
    /// Seconds since the Unix epoch at which the run finished.
    pub discovery_timestamp: Option<u64>,
    pub total_switches_discovered: usize,
    pub topology_depth: usize,
}

impl Inventory {
    pub fn from_graph(graph: &TopologyGraph) -> Self {
        let hosts: IndexMap<String, InventoryHost> = graph
            .discovered()
            .map(|record| {
                let neighbor_count = graph.edges().filter(|e| e.touches(record.address)).count();
                let host = InventoryHost {
                    ansible_host: record.address,
                    vendor: record.vendor.to_string(),
                    model: or_unknown(record.model()),
                    hostname: or_unknown(record.hostname()),
                    serial_number: or_unknown(record.serial_number()),
                    os_version: or_unknown(record.os_version()),
                    discovery_depth: record.depth,
                    neighbor_count,
                };
                (record.address.to_string(), host)
            })
            .collect();

        let unreachable = graph
            .unreachable()
            .map(|placeholder| UnreachableHost {
                address: placeholder.address,
                depth: placeholder.depth,
                reason: placeholder.reason.to_string(),
            })
            .collect();

        Self {
            total_switches_discovered: hosts.len(),
            hosts,
            unreachable,
            discovery_timestamp: graph.finished_at,
            topology_depth: graph.discovered().map(|r| r.depth).max().unwrap_or(0),
        }
    }

    /// Ansible inventory document with every switch in a `switches` group.
    pub fn to_ansible(&self) -> AnsibleInventory<'_> {
        AnsibleInventory {
            all: AnsibleAll {
                children: AnsibleChildren {
                    switches: SwitchGroup {
                        hosts: &self.hosts,
                        vars: GroupVars {
                            ansible_connection: "network_cli",
                            ansible_python_interpreter: "{{ ansible_playbook_python }}",
                        },
                    },
                },
                vars: AllVars {
                    discovery_timestamp: self.discovery_timestamp,
                    total_switches_discovered: self.total_switches_discovered,
                    topology_depth: self.topology_depth,
                    unreachable_hosts: &self.unreachable,
                },
            },
        }
    }

    /// Render the Ansible inventory as YAML.
    pub fn to_yaml(&self) -> serde_yaml::Result<String> {
        serde_yaml::to_string(&self.to_ansible())
    }
}

fn or_unknown(value: Option<&str>) -> String {
    value.unwrap_or(UNKNOWN).to_string()
}

#[derive(Debug, Serialize)]
pub struct AnsibleInventory<'a> {
    all: AnsibleAll<'a>,
}

#[derive(Debug, Serialize)]
struct AnsibleAll<'a> {
    children: AnsibleChildren<'a>,
    vars: AllVars<'a>,
}

#[derive(Debug, Serialize)]
struct AnsibleChildren<'a> {
    switches: SwitchGroup<'a>,
}

#[derive(Debug, Serialize)]
struct SwitchGroup<'a> {
    hosts: &'a IndexMap<String, InventoryHost>,
    vars: GroupVars,
}

#[derive(Debug, Serialize)]
struct GroupVars {
    ansible_connection: &'static str,
    ansible_python_interpreter: &'static str,
}

#[derive(Debug, Serialize)]
struct AllVars<'a> {
    discovery_timestamp: Option<u64>,
    total_switches_discovered: usize,
    topology_depth: usize,
    unreachable_hosts: &'a [UnreachableHost],
}
