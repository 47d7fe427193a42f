//! Nomad platform.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::collect::parse::{self, FieldStyle, LldpLabels, SystemLabels};
use crate::collect::{CommandSet, Collector};
use crate::error::ParseError;
use crate::model::{Interface, LldpNeighbor, MacEntry, SystemInfo, Vendor};
use crate::platform::PlatformDefinition;

pub const SIGNATURES: &[&str] = &["nomad"];

/// Create the Nomad platform definition.
pub fn platform() -> PlatformDefinition {
    let mut platform = PlatformDefinition::new(Vendor::Nomad, r"(?:^|\n)[\w\-.@:~]+[>#$]")
        .unwrap()
        .with_identify_command("show version")
        .with_on_open_command("terminal length 0")
        .with_failure_pattern("% Invalid")
        .with_failure_pattern("Unknown command");
    for sig in SIGNATURES {
        platform = platform.with_signature(*sig);
    }
    platform
}

const COMMANDS: CommandSet = CommandSet {
    system_info: "show version",
    interfaces: "show interface",
    lldp_neighbors: "show lldp neighbors",
    mac_table: "show mac-address-table",
};

const SYSTEM: SystemLabels = SystemLabels {
    hostname: &["Hostname", "System Name"],
    model: &["Model", "Product"],
    os_version: &["Version", "Software Version"],
    serial_number: &["Serial Number", "Serial"],
    uptime: &["Uptime"],
    location: &["Location"],
    contact: &["Contact"],
    description: &["Description"],
    management_address: &["Management Address", "IP Address"],
    management_mac: &["MAC Address", "Base MAC"],
};

const LLDP: LldpLabels = LldpLabels {
    style: FieldStyle::Colon,
    block_header: None,
    local_interface: &["Local Interface"],
    chassis_id: &["Chassis ID"],
    port_id: &["Port ID"],
    port_description: &["Port Description"],
    system_name: &["System Name"],
    system_description: &["System Description"],
    management_address: &["Management Address"],
};

static PORT_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?P<name>(?:eth|ge|gi|lan|port)[\w/.\-]*)\s").unwrap());

static PORT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:eth|ge|gi|lan|port)[\w/.\-]*").unwrap());

/// Collector for Nomad switches.
#[derive(Debug, Clone, Copy)]
pub struct NomadCollector;

impl Collector for NomadCollector {
    fn vendor(&self) -> Vendor {
        Vendor::Nomad
    }

    fn commands(&self) -> &CommandSet {
        &COMMANDS
    }

    fn parse_system_info(&self, output: &str) -> Result<SystemInfo, ParseError> {
        parse::parse_system_info(output, FieldStyle::Colon, &SYSTEM)
    }

    fn parse_interfaces(&self, output: &str) -> Result<Vec<Interface>, ParseError> {
        parse::parse_interface_rows(output, &PORT_ROW)
    }

    fn parse_lldp_neighbors(&self, output: &str) -> Result<Vec<LldpNeighbor>, ParseError> {
        parse::parse_lldp_blocks(output, &LLDP)
    }

    fn parse_mac_table(&self, output: &str) -> Result<Vec<MacEntry>, ParseError> {
        parse::parse_mac_rows(output, &PORT_NAME)
    }
}
