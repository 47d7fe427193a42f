//! Kontron KSwitch platform (Microchip iStaX firmware).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::collect::parse::{self, FieldStyle, LldpLabels, SystemLabels};
use crate::collect::{CommandSet, Collector};
use crate::error::ParseError;
use crate::model::{Interface, LldpNeighbor, MacEntry, SystemInfo, Vendor};
use crate::platform::PlatformDefinition;

pub const SIGNATURES: &[&str] = &["kontron", "kswitch", "istax"];

/// Create the Kontron platform definition.
pub fn platform() -> PlatformDefinition {
    let mut platform = PlatformDefinition::new(Vendor::Kontron, r"(?:^|\n)[\w\-.]+(?:\([\w\-]+\))?[>#]")
        .unwrap()
        .with_identify_command("show version")
        .with_on_open_command("terminal length 0")
        .with_failure_pattern("% Invalid word detected")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous word detected");
    for sig in SIGNATURES {
        platform = platform.with_signature(*sig);
    }
    platform
}

const COMMANDS: CommandSet = CommandSet {
    system_info: "show version",
    interfaces: "show interface * status",
    lldp_neighbors: "show lldp neighbors",
    mac_table: "show mac address-table",
};

const SYSTEM: SystemLabels = SystemLabels {
    hostname: &["System Name"],
    model: &["Product"],
    os_version: &["Software Version", "Version"],
    serial_number: &["Serial Number", "Board Serial"],
    uptime: &["System Uptime"],
    location: &["System Location"],
    contact: &["System Contact"],
    description: &["System Description"],
    management_address: &["IP Address", "IPv4 Address"],
    management_mac: &["MAC Address"],
};

const LLDP: LldpLabels = LldpLabels {
    style: FieldStyle::Colon,
    block_header: None,
    local_interface: &["Local Interface", "Local Port"],
    chassis_id: &["Chassis ID"],
    port_id: &["Port ID"],
    port_description: &["Port Description"],
    system_name: &["System Name"],
    system_description: &["System Description"],
    management_address: &["Management Address"],
};

static PORT_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?P<name>[\w.]*Ethernet\s+\d+/\d+)\s").unwrap());

static PORT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w.]*Ethernet\s+\d+/\d+").unwrap());

/// Collector for Kontron iStaX switches.
#[derive(Debug, Clone, Copy)]
pub struct KontronCollector;

impl Collector for KontronCollector {
    fn vendor(&self) -> Vendor {
        Vendor::Kontron
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
    fn test_platform_prompts() {
        let platform = platform();
        assert!(platform.prompt.is_match(b"EthernetSwitch#"));
        assert!(platform.prompt.is_match(b"line\nEthernetSwitch(config)# "));
        assert!(platform.prompt.is_match(b"sw-1>"));
        assert!(!platform.prompt.is_match(b"(BOBCAT) >"));
    }

    #[test]
    fn test_system_info() {
        let output = "\
MAC Address      : 00-01-c1-00-00-01
Previous Restart : Cold
System Contact   :
System Name      : ks-core
System Location  : Depot
System Uptime    : 0d 00:05:12

Bootloader
----------
Image            : RedBoot (standalone)
Version          : v1.0 (RedBoot)

Active Image
------------
Image            : managed
Version          : KSwitch (Microchip iStaX) 2022.03

Product          : Kontron KSwitch D10 MMT
Software Version : 2022.03-1
Serial Number    : KS1234567
";
        let info = KontronCollector.parse_system_info(output).unwrap();
        assert_eq!(info.hostname.as_deref(), Some("ks-core"));
        assert_eq!(info.model.as_deref(), Some("Kontron KSwitch D10 MMT"));
        assert_eq!(info.os_version.as_deref(), Some("2022.03-1"));
        assert_eq!(info.serial_number.as_deref(), Some("KS1234567"));
        assert_eq!(info.management_mac.as_deref(), Some("00:01:c1:00:00:01"));
        assert_eq!(info.contact, None);
    }

    #[test]
    fn test_interfaces() {
        let output = "\
Interface             Mode     Speed & Duplex  Flow Control  Max Frame  Excessive  Link
--------------------  -------  --------------  ------------  ---------  ---------  -----
GigabitEthernet 1/1   enabled  Auto            disabled      10240      Discard    1Gfdx
GigabitEthernet 1/2   enabled  Auto            disabled      10240      Discard    Down
2.5GigabitEthernet 1/9 disabled Auto           disabled      10240      Discard    Down
";
        let ports = KontronCollector.parse_interfaces(output).unwrap();
        assert_eq!(ports.len(), 3);
        assert_eq!(ports[0].name, "GigabitEthernet 1/1");
        assert_eq!(ports[0].link, LinkState::Up);
        assert_eq!(ports[0].speed.as_deref(), Some("1Gfdx"));
        assert_eq!(ports[1].link, LinkState::Down);
        assert_eq!(ports[2].name, "2.5GigabitEthernet 1/9");
        assert_eq!(ports[2].link, LinkState::Disabled);
    }

    #[test]
    fn test_mac_table() {
        let output = "\
Type     VID  MAC Address        Ports
-------  ---  -----------------  ---------------------
Static   1    00-01-c1-00-00-01  CPU
Dynamic  1    00-01-c1-00-00-02  GigabitEthernet 1/1
";
        let entries = KontronCollector.parse_mac_table(output).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].interface, "CPU");
        assert_eq!(entries[1].interface, "GigabitEthernet 1/1");
        assert_eq!(entries[1].vlan, Some(1));
    }
}
