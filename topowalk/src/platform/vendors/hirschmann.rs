//! Hirschmann HiOS platform (BOBCAT, BXP, RSP ...).
//!
//! HiOS prints its system and LLDP pages as dotted `Label....value` lists
//! and prompts as `(BOBCAT) >` or `(BOBCAT) #`, optionally prefixed with `!`
//! (unsaved config) or `*`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::collect::parse::{self, FieldStyle, LldpLabels, SystemLabels};
use crate::collect::{CommandSet, Collector};
use crate::error::ParseError;
use crate::model::{Interface, LldpNeighbor, MacEntry, SystemInfo, Vendor};
use crate::platform::PlatformDefinition;

pub const SIGNATURES: &[&str] = &["hirschmann", "hios", "bobcat"];

/// Create the Hirschmann platform definition.
pub fn platform() -> PlatformDefinition {
    let mut platform = PlatformDefinition::new(Vendor::Hirschmann, r"(?:^|\n)[!*]{0,2}\([^)\n]+\)\s?[>#]")
        .unwrap()
        .with_identify_command("show system info")
        .with_on_open_command("cli numlines 0")
        .with_failure_pattern("Error: Invalid command")
        .with_failure_pattern("Invalid input")
        .with_failure_pattern("Incomplete command")
        .with_terminal_size(511, 24);
    for sig in SIGNATURES {
        platform = platform.with_signature(*sig);
    }
    platform
}

const COMMANDS: CommandSet = CommandSet {
    system_info: "show system info",
    interfaces: "show port all",
    lldp_neighbors: "show lldp remote-data",
    mac_table: "show mac-addr-table",
};

const SYSTEM: SystemLabels = SystemLabels {
    hostname: &["System name"],
    model: &["Device hardware description"],
    os_version: &["Firmware software release (RAM)", "Firmware software release (NVM)"],
    serial_number: &["Serial number"],
    uptime: &["System uptime"],
    location: &["System location"],
    contact: &["System contact"],
    description: &["System Description"],
    management_address: &["IP address (management)"],
    management_mac: &["MAC address (management)"],
};

static REMOTE_DATA_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*Remote data,\s*(?P<local>\d+/\d+)").unwrap());

static PORT_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?P<name>\d+/\d+)\s").unwrap());

static PORT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+/\d+\b").unwrap());

fn lldp_labels() -> LldpLabels {
    LldpLabels {
        style: FieldStyle::Dotted,
        block_header: Some(&*REMOTE_DATA_HEADER),
        local_interface: &[],
        chassis_id: &["Chassis ID"],
        port_id: &["Port ID"],
        port_description: &["Port description"],
        system_name: &["System name"],
        system_description: &["System description"],
        management_address: &["IPv4 Management address", "IPv6 Management address"],
    }
}

/// Collector for Hirschmann HiOS switches.
#[derive(Debug, Clone, Copy)]
pub struct HirschmannCollector;

impl Collector for HirschmannCollector {
    fn vendor(&self) -> Vendor {
        Vendor::Hirschmann
    }

    fn commands(&self) -> &CommandSet {
        &COMMANDS
    }

    fn parse_system_info(&self, output: &str) -> Result<SystemInfo, ParseError> {
        let mut info = parse::parse_system_info(output, FieldStyle::Dotted, &SYSTEM)?;

        // Older firmware has no hardware description line.
        if info.model.is_none() {
            info.model = info.description.as_deref().and_then(|description| {
                ["BOBCAT", "BXP"]
                    .into_iter()
                    .find(|family| description.contains(family))
                    .map(str::to_string)
            });
        }
        Ok(info)
    }

    fn parse_interfaces(&self, output: &str) -> Result<Vec<Interface>, ParseError> {
        parse::parse_interface_rows(output, &PORT_ROW)
    }

    fn parse_lldp_neighbors(&self, output: &str) -> Result<Vec<LldpNeighbor>, ParseError> {
        parse::parse_lldp_blocks(output, &lldp_labels())
    }

    fn parse_mac_table(&self, output: &str) -> Result<Vec<MacEntry>, ParseError> {
        parse::parse_mac_rows(output, &PORT_NAME)
    }
}
