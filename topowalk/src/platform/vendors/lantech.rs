//! Lantech platform (TPES and IPES industrial switches).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::collect::parse::{self, FieldStyle, LldpLabels, SystemLabels};
use crate::collect::{CommandSet, Collector};
use crate::error::ParseError;
use crate::model::{Interface, LldpNeighbor, MacEntry, SystemInfo, Vendor};
use crate::platform::PlatformDefinition;

pub const SIGNATURES: &[&str] = &["lantech", "tpes"];

/// Create the Lantech platform definition.
pub fn platform() -> PlatformDefinition {
    let mut platform = PlatformDefinition::new(Vendor::Lantech, r"(?:^|\n)[^\n]{0,60}>")
        .unwrap()
        .with_identify_command("System configuration")
        .with_on_open_command("cli numlines 0")
        .with_failure_pattern("Invalid parameter")
        .with_failure_pattern("Unknown command");
    for sig in SIGNATURES {
        platform = platform.with_signature(*sig);
    }
    platform
}

const COMMANDS: CommandSet = CommandSet {
    system_info: "System configuration",
    interfaces: "Port configuration",
    lldp_neighbors: "show lldp remote",
    mac_table: "show mac-address-table",
};

const SYSTEM: SystemLabels = SystemLabels {
    hostname: &["System Name", "Name"],
    model: &["Model Name", "Model"],
    os_version: &["Firmware Version", "Software Version"],
    serial_number: &["Serial Number"],
    uptime: &["System Up Time", "Uptime"],
    location: &["System Location", "Location"],
    contact: &["System Contact", "Contact"],
    description: &["System Description", "Description"],
    management_address: &["IP Address"],
    management_mac: &["MAC Address"],
};

const LLDP: LldpLabels = LldpLabels {
    style: FieldStyle::Colon,
    block_header: None,
    local_interface: &["Local Port", "Local Interface"],
    chassis_id: &["Chassis Id", "Chassis ID"],
    port_id: &["Port Id", "Port ID"],
    port_description: &["Port Description"],
    system_name: &["System Name"],
    system_description: &["System Description"],
    management_address: &["Management Address"],
};

/// Ports are plain numbers.
static PORT_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?P<name>\d{1,3})\s").unwrap());

static PORT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d{1,3}\b").unwrap());

/// Collector for Lantech switches.
#[derive(Debug, Clone, Copy)]
pub struct LantechCollector;

impl Collector for LantechCollector {
    fn vendor(&self) -> Vendor {
        Vendor::Lantech
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinkState;

    #[test]
    fn test_platform_commands() {
        let platform = platform();
        assert_eq!(platform.identification.command, "System configuration");
        assert_eq!(platform.on_open_commands, vec!["cli numlines 0".to_string()]);
        assert!(platform.prompt.is_match(b"TPES-L3G2408>"));
        assert_eq!(COMMANDS.system_info, platform.identification.command);
    }

    #[test]
    fn test_system_info() {
        let output = "\
System Name        : lt-access-3
System Location    : Platform 2
Model Name         : TPES-L3G2408
Firmware Version   : v1.08
MAC Address        : 00:40:c7:00:00:03
IP Address         : 10.0.0.3
System Up Time     : 1 days, 2:03:04
";
        let info = LantechCollector.parse_system_info(output).unwrap();
        assert_eq!(info.hostname.as_deref(), Some("lt-access-3"));
        assert_eq!(info.model.as_deref(), Some("TPES-L3G2408"));
        assert_eq!(info.os_version.as_deref(), Some("v1.08"));
        assert_eq!(info.management_address, Some("10.0.0.3".parse().unwrap()));
        assert_eq!(info.uptime.as_deref(), Some("1 days, 2:03:04"));
    }

    #[test]
    fn test_interfaces() {
        let output = "\
Port  State    Speed/Duplex  Link
----  -------  ------------  ----
1     Enable   100M          Up
2     Enable   Auto          Down
3     Disable  Auto          Down
";
        let ports = LantechCollector.parse_interfaces(output).unwrap();
        assert_eq!(ports.len(), 3);
        assert_eq!(ports[0].name, "1");
        assert_eq!(ports[0].link, LinkState::Up);
        assert_eq!(ports[0].speed.as_deref(), Some("100M"));
        assert_eq!(ports[2].link, LinkState::Disabled);
    }

    #[test]
    fn test_mac_table() {
        let output = "\
VID  MAC Address        Port  Type
---  -----------------  ----  -------
1    00:40:c7:00:00:09  3     Dynamic
";
        let entries = LantechCollector.parse_mac_table(output).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].interface, "3");
        assert_eq!(entries[0].vlan, Some(1));
    }
}
