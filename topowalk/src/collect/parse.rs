//! Text parsers shared by the vendor collectors.
//!
//! Switch CLIs differ in wording far more than in structure: system pages are
//! `label : value` or `label.....value` lists, LLDP tables are blocks of such
//! lists, and port and MAC tables are whitespace-separated rows. Vendors
//! describe their wording with label tables and row patterns; the parsing
//! itself lives here.

use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;
use crate::model::{Capability, Interface, LinkState, LldpNeighbor, MacEntry, SystemInfo};
use crate::platform::vendors::guess_vendor;

static DOTTED_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\S.*?)\s*\.{2,}\s*(.*?)\s*$").unwrap());

static MAC_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:[0-9a-f]{2}(?:[:-][0-9a-f]{2}){5}|[0-9a-f]{4}\.[0-9a-f]{4}\.[0-9a-f]{4})\b")
        .unwrap()
});

static DUPLEX_SPEED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\d+(?:\.\d+)?[mg](?:fdx|hdx)$").unwrap());

static BARE_SPEED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\d+(?:\.\d+)?[mg](?:bps)?$").unwrap());

/// Phrases switches print instead of an empty LLDP table.
const EMPTY_TABLE_MARKERS: [&str; 4] = ["no entries", "no lldp", "no neighbor", "empty"];

/// How a vendor lays out `label / value` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStyle {
    /// `System name.........sw1`
    Dotted,
    /// `System Name      : sw1`
    Colon,
}

impl FieldStyle {
    /// Split one line into a trimmed label and value.
    pub fn split<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        match self {
            FieldStyle::Colon => {
                let (key, value) = line.split_once(':')?;
                let key = key.trim();
                if key.is_empty() {
                    return None;
                }
                Some((key, value.trim()))
            }
            FieldStyle::Dotted => {
                let caps = DOTTED_FIELD.captures(line)?;
                Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
            }
        }
    }
}

/// Label/value pairs of one output, looked up by label aliases.
#[derive(Debug)]
pub struct Fields<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Fields<'a> {
    pub fn parse(output: &'a str, style: FieldStyle) -> Self {
        Self {
            pairs: output.lines().filter_map(|line| style.split(line)).collect(),
        }
    }

    /// First non-empty value of the first label, in order, that is present.
    pub fn get(&self, labels: &[&str]) -> Option<&'a str> {
        labels.iter().find_map(|label| {
            self.pairs
                .iter()
                .find(|(key, value)| key.eq_ignore_ascii_case(label) && !value.is_empty())
                .map(|(_, value)| *value)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Label aliases for each [`SystemInfo`] field.
#[derive(Debug, Clone, Copy)]
pub struct SystemLabels {
    pub hostname: &'static [&'static str],
    pub model: &'static [&'static str],
    pub os_version: &'static [&'static str],
    pub serial_number: &'static [&'static str],
    pub uptime: &'static [&'static str],
    pub location: &'static [&'static str],
    pub contact: &'static [&'static str],
    pub description: &'static [&'static str],
    pub management_address: &'static [&'static str],
    pub management_mac: &'static [&'static str],
}

/// Parse a system information page.
///
/// Fails only when not a single field was recognized.
pub fn parse_system_info(
    output: &str,
    style: FieldStyle,
    labels: &SystemLabels,
) -> Result<SystemInfo, ParseError> {
    let fields = Fields::parse(output, style);
    let text = |aliases: &[&str]| fields.get(aliases).map(str::to_string);

    let info = SystemInfo {
        hostname: text(labels.hostname),
        model: text(labels.model),
        os_version: text(labels.os_version),
        serial_number: text(labels.serial_number),
        uptime: text(labels.uptime),
        location: text(labels.location),
        contact: text(labels.contact),
        description: text(labels.description),
        management_address: fields.get(labels.management_address).and_then(extract_ip),
        management_mac: fields.get(labels.management_mac).and_then(normalize_mac),
    };

    if info == SystemInfo::default() {
        return Err(ParseError::new(
            Capability::SystemInfo,
            "no system fields recognized",
            output,
        ));
    }
    Ok(info)
}

/// Label aliases and block layout of an LLDP neighbor listing.
#[derive(Debug, Clone, Copy)]
pub struct LldpLabels {
    pub style: FieldStyle,
    /// Line that opens a neighbor block; the `local` group names the port.
    pub block_header: Option<&'static Regex>,
    /// Labels naming the local port; each one also opens a new block.
    pub local_interface: &'static [&'static str],
    pub chassis_id: &'static [&'static str],
    pub port_id: &'static [&'static str],
    pub port_description: &'static [&'static str],
    pub system_name: &'static [&'static str],
    pub system_description: &'static [&'static str],
    pub management_address: &'static [&'static str],
}

#[derive(Debug, Default)]
struct NeighborBlock {
    local: Option<String>,
    chassis_id: Option<String>,
    port_id: Option<String>,
    port_description: Option<String>,
    system_name: Option<String>,
    system_description: Option<String>,
    management_address: Option<IpAddr>,
}

impl NeighborBlock {
    fn is_empty(&self) -> bool {
        self.local.is_none()
            && self.chassis_id.is_none()
            && self.port_id.is_none()
            && self.port_description.is_none()
            && self.system_name.is_none()
            && self.management_address.is_none()
    }

    fn into_neighbor(self) -> LldpNeighbor {
        // Port IDs that are MACs say nothing useful about the remote port.
        let remote_interface = match self.port_id {
            Some(id) if normalize_mac(&id).is_none() => Some(id),
            id => self.port_description.or(id),
        };
        let remote_vendor = self
            .system_description
            .as_deref()
            .or(self.system_name.as_deref())
            .map(guess_vendor)
            .unwrap_or_default();

        LldpNeighbor {
            local_interface: self.local,
            remote_interface,
            remote_system_name: self.system_name,
            remote_management_address: self.management_address,
            remote_chassis_id: self
                .chassis_id
                .map(|id| normalize_mac(&id).unwrap_or(id)),
            remote_vendor,
        }
    }
}

fn matches_label(key: &str, labels: &[&str]) -> bool {
    labels.iter().any(|label| key.eq_ignore_ascii_case(label))
}

fn set_once(slot: &mut Option<String>, value: &str) {
    if slot.is_none() && !value.is_empty() {
        *slot = Some(value.to_string());
    }
}

/// Parse an LLDP neighbor listing made of label/value blocks.
pub fn parse_lldp_blocks(output: &str, labels: &LldpLabels) -> Result<Vec<LldpNeighbor>, ParseError> {
    let mut blocks = Vec::new();
    let mut current = NeighborBlock::default();

    for line in output.lines() {
        if let Some(header) = labels.block_header.and_then(|re| re.captures(line)) {
            blocks.push(std::mem::take(&mut current));
            current.local = header.name("local").map(|m| m.as_str().to_string());
            continue;
        }

        let Some((key, value)) = labels.style.split(line) else {
            continue;
        };

        if matches_label(key, labels.local_interface) {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            set_once(&mut current.local, value);
        } else if matches_label(key, labels.chassis_id) {
            set_once(&mut current.chassis_id, value);
        } else if matches_label(key, labels.port_id) {
            set_once(&mut current.port_id, value);
        } else if matches_label(key, labels.port_description) {
            set_once(&mut current.port_description, value);
        } else if matches_label(key, labels.system_name) {
            set_once(&mut current.system_name, value);
        } else if matches_label(key, labels.system_description) {
            set_once(&mut current.system_description, value);
        } else if matches_label(key, labels.management_address) && current.management_address.is_none() {
            current.management_address = extract_ip(value);
        }
    }
    blocks.push(current);

    let neighbors: Vec<_> = blocks
        .into_iter()
        .filter(|block| !block.is_empty())
        .map(NeighborBlock::into_neighbor)
        .collect();

    if neighbors.is_empty() && !output.trim().is_empty() {
        let lower = output.to_lowercase();
        if !EMPTY_TABLE_MARKERS.iter().any(|marker| lower.contains(marker)) {
            return Err(ParseError::new(
                Capability::LldpNeighbors,
                "no neighbor entries recognized",
                output,
            ));
        }
    }
    Ok(neighbors)
}

/// Parse a port table.
///
/// `name` must match at the start of a row and capture the port name in a
/// `name` group. The rest of the row is scanned for admin state, link state
/// and speed.
pub fn parse_interface_rows(output: &str, name: &Regex) -> Result<Vec<Interface>, ParseError> {
    let interfaces: Vec<_> = output
        .lines()
        .filter_map(|line| {
            let caps = name.captures(line)?;
            let port = caps.name("name")?;
            let whole = caps.get(0)?;
            let tokens: Vec<&str> = line[whole.end()..].split_whitespace().collect();
            let (link, speed) = link_from_tokens(&tokens);
            Some(Interface {
                name: collapse_whitespace(port.as_str()),
                link,
                speed,
            })
        })
        .collect();

    if interfaces.is_empty() {
        return Err(ParseError::new(
            Capability::Interfaces,
            "no port rows recognized",
            output,
        ));
    }
    Ok(interfaces)
}

fn link_from_tokens(tokens: &[&str]) -> (LinkState, Option<String>) {
    let admin_disabled = tokens
        .first()
        .is_some_and(|t| matches!(t.to_ascii_lowercase().as_str(), "disable" | "disabled"));

    let mut link = LinkState::Unknown;
    let mut speed = None;
    for token in tokens.iter().rev() {
        match token.to_ascii_lowercase().as_str() {
            "up" | "link-up" | "connected" | "forwarding" => link = LinkState::Up,
            "down" | "link-down" | "notconnect" | "notconnected" | "not-connected" => {
                link = LinkState::Down
            }
            lower if DUPLEX_SPEED.is_match(lower) => {
                link = LinkState::Up;
                speed = Some(token.to_string());
            }
            _ => continue,
        }
        break;
    }

    if speed.is_none() {
        speed = tokens
            .windows(2)
            .find(|pair| {
                pair[0].chars().all(|c| c.is_ascii_digit())
                    && matches!(pair[1].to_ascii_lowercase().as_str(), "full" | "half")
            })
            .map(|pair| format!("{} {}", pair[0], pair[1]))
            .or_else(|| {
                tokens
                    .iter()
                    .find(|t| BARE_SPEED.is_match(t))
                    .map(|t| t.to_string())
            });
    }

    if admin_disabled {
        link = LinkState::Disabled;
    }
    (link, speed)
}

/// Parse a MAC address table.
///
/// The VLAN is the first numeric column before the MAC. The port is the first
/// match of `interface` after the MAC, or failing that the next column.
pub fn parse_mac_rows(output: &str, interface: &Regex) -> Result<Vec<MacEntry>, ParseError> {
    let mut entries = Vec::new();

    for line in output.lines() {
        let Some(found) = MAC_ADDRESS.find(line) else {
            continue;
        };
        let Some(mac) = normalize_mac(found.as_str()) else {
            continue;
        };
        let before = &line[..found.start()];
        let after = &line[found.end()..];

        let vlan = before
            .split_whitespace()
            .find_map(|t| t.parse::<u16>().ok())
            .filter(|vid| (1..=4094).contains(vid));
        let port = interface
            .find(after)
            .map(|m| collapse_whitespace(m.as_str()))
            .or_else(|| after.split_whitespace().next().map(str::to_string));

        if let Some(port) = port {
            entries.push(MacEntry {
                mac,
                vlan,
                interface: port,
            });
        }
    }

    if entries.is_empty() && !output.trim().is_empty() && !output.to_lowercase().contains("mac") {
        return Err(ParseError::new(
            Capability::MacTable,
            "no MAC table recognized",
            output,
        ));
    }
    Ok(entries)
}

/// Normalize a MAC address in colon, dash or dotted form to `aa:bb:cc:dd:ee:ff`.
pub fn normalize_mac(value: &str) -> Option<String> {
    let token = value.split_whitespace().next()?;
    let hex: Vec<char> = token
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .collect();
    if hex.len() != 12 || !hex.iter().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let mut mac = String::with_capacity(17);
    for (i, c) in hex.iter().enumerate() {
        if i > 0 && i % 2 == 0 {
            mac.push(':');
        }
        mac.push(c.to_ascii_lowercase());
    }
    Some(mac)
}

/// First usable IP address in a value such as `10.0.0.2 (IPv4)`.
pub fn extract_ip(value: &str) -> Option<IpAddr> {
    value
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '(' | ')' | '/' | '[' | ']'))
        .filter_map(|token| token.parse::<IpAddr>().ok())
        .find(|ip| !ip.is_unspecified())
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Vendor;

    #[test]
    fn test_field_styles() {
        assert_eq!(
            FieldStyle::Dotted.split("System name.......................sw-core"),
            Some(("System name", "sw-core"))
        );
        assert_eq!(
            FieldStyle::Dotted.split("Firmware software release (RAM)...HiOS-3S-08.0.00"),
            Some(("Firmware software release (RAM)", "HiOS-3S-08.0.00"))
        );
        assert_eq!(
            FieldStyle::Colon.split("MAC Address      : 00-01-c1-00-00-01"),
            Some(("MAC Address", "00-01-c1-00-00-01"))
        );
        assert_eq!(FieldStyle::Colon.split("Bootloader"), None);
    }

    #[test]
    fn test_fields_label_priority() {
        let output = "Version          : 1.0 bootloader\nSoftware Version : 2.3.1\nSystem Contact   :\n";
        let fields = Fields::parse(output, FieldStyle::Colon);
        assert_eq!(fields.get(&["Software Version", "Version"]), Some("2.3.1"));
        assert_eq!(fields.get(&["system contact"]), None);
    }

    #[test]
    fn test_system_info_without_fields_is_error() {
        let labels = SystemLabels {
            hostname: &["System Name"],
            model: &[],
            os_version: &[],
            serial_number: &[],
            uptime: &[],
            location: &[],
            contact: &[],
            description: &[],
            management_address: &[],
            management_mac: &[],
        };
        let err = parse_system_info("garbage", FieldStyle::Colon, &labels).unwrap_err();
        assert_eq!(err.capability, Capability::SystemInfo);
        assert_eq!(err.raw, "garbage");
    }

    #[test]
    fn test_normalize_mac() {
        assert_eq!(normalize_mac("00-01-C1-00-00-0A").as_deref(), Some("00:01:c1:00:00:0a"));
        assert_eq!(normalize_mac("0001.c100.000a").as_deref(), Some("00:01:c1:00:00:0a"));
        assert_eq!(normalize_mac("ec:e5:55:00:00:02").as_deref(), Some("ec:e5:55:00:00:02"));
        assert_eq!(normalize_mac("1/2"), None);
        assert_eq!(normalize_mac("GigabitEthernet 1/2"), None);
    }

    #[test]
    fn test_extract_ip() {
        assert_eq!(extract_ip("10.0.0.2 (IPv4)"), Some("10.0.0.2".parse().unwrap()));
        assert_eq!(extract_ip("10.0.0.7/24"), Some("10.0.0.7".parse().unwrap()));
        assert_eq!(extract_ip("0.0.0.0"), None);
        assert_eq!(extract_ip("none"), None);
    }

    #[test]
    fn test_link_from_tokens() {
        assert_eq!(
            link_from_tokens(&["enabled", "Auto", "disabled", "10240", "Discard", "1Gfdx"]),
            (LinkState::Up, Some("1Gfdx".to_string()))
        );
        assert_eq!(
            link_from_tokens(&["enable", "auto", "auto", "1000", "full", "up", "enable"]),
            (LinkState::Up, Some("1000 full".to_string()))
        );
        assert_eq!(
            link_from_tokens(&["disabled", "Auto", "disabled", "10240", "Discard", "Down"]),
            (LinkState::Disabled, None)
        );
        assert_eq!(link_from_tokens(&["enable", "auto"]), (LinkState::Unknown, None));
    }

    #[test]
    fn test_lldp_blocks_split_on_local_label() {
        let labels = LldpLabels {
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
        let output = "\
Local Interface    : GigabitEthernet 1/1
Chassis ID         : 00-01-C1-00-00-02
Port ID            : 00-01-C1-00-00-03
Port Description   : GigabitEthernet 1/2
System Name        : sw2
System Description : Kontron KSwitch D10
Management Address : 10.0.0.2 (IPv4)

Local Interface    : GigabitEthernet 1/4
Chassis ID         : 00-11-22-33-44-55
Port ID            : 7
System Name        : printer
";
        let neighbors = parse_lldp_blocks(output, &labels).unwrap();
        assert_eq!(neighbors.len(), 2);

        assert_eq!(neighbors[0].local_interface.as_deref(), Some("GigabitEthernet 1/1"));
        assert_eq!(neighbors[0].remote_interface.as_deref(), Some("GigabitEthernet 1/2"));
        assert_eq!(neighbors[0].remote_chassis_id.as_deref(), Some("00:01:c1:00:00:02"));
        assert_eq!(
            neighbors[0].remote_management_address,
            Some("10.0.0.2".parse().unwrap())
        );
        assert_eq!(neighbors[0].remote_vendor, Vendor::Kontron);

        assert_eq!(neighbors[1].remote_interface.as_deref(), Some("7"));
        assert_eq!(neighbors[1].remote_management_address, None);
        assert_eq!(neighbors[1].remote_vendor, Vendor::Unknown);
    }

    #[test]
    fn test_lldp_block_without_local_port() {
        let labels = LldpLabels {
            style: FieldStyle::Colon,
            block_header: None,
            local_interface: &["Local Interface"],
            chassis_id: &["Chassis ID"],
            port_id: &["Port ID"],
            port_description: &[],
            system_name: &["System Name"],
            system_description: &[],
            management_address: &["Management Address"],
        };
        let output = "\
Chassis ID         : 00-01-C1-00-00-02
Port ID            : GigabitEthernet 1/2
System Name        : sw2
Management Address : 10.0.0.2
";
        let neighbors = parse_lldp_blocks(output, &labels).unwrap();
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].local_interface, None);
        assert_eq!(neighbors[0].remote_interface.as_deref(), Some("GigabitEthernet 1/2"));
    }

    #[test]
    fn test_lldp_empty_and_garbage() {
        let labels = LldpLabels {
            style: FieldStyle::Colon,
            block_header: None,
            local_interface: &["Local Interface"],
            chassis_id: &[],
            port_id: &[],
            port_description: &[],
            system_name: &[],
            system_description: &[],
            management_address: &[],
        };
        assert!(parse_lldp_blocks("", &labels).unwrap().is_empty());
        assert!(parse_lldp_blocks("No entries found", &labels).unwrap().is_empty());
        assert!(parse_lldp_blocks("%% something odd", &labels).is_err());
    }

    #[test]
    fn test_mac_rows() {
        let port = Regex::new(r"\d+/\d+").unwrap();
        let output = "\
VLAN ID  MAC address        Interface  IfIndex  Status
-------  -----------------  ---------  -------  --------
1        00:80:63:00:00:01  1/1        1        learned
10       00:80:63:00:00:02  1/3        3        learned
";
        let entries = parse_mac_rows(output, &port).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].mac, "00:80:63:00:00:02");
        assert_eq!(entries[1].vlan, Some(10));
        assert_eq!(entries[1].interface, "1/3");

        assert!(parse_mac_rows("VLAN  MAC  Port\n", &port).unwrap().is_empty());
        assert!(parse_mac_rows("unexpected", &port).is_err());
    }
}
