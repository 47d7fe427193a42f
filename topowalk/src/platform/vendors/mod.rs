//! Built-in vendor platforms and collectors.
//!
//! Each vendor module provides:
//!
//! - `SIGNATURES`: markers that identify the vendor in command output
//! - `platform()`: prompt, pager, failure strings and identification
//! - a [`Collector`] with the vendor's command strings and label tables

pub mod hirschmann;
pub mod kontron;
pub mod lantech;
pub mod nomad;

use crate::collect::Collector;
use crate::model::Vendor;

use super::PlatformDefinition;

/// Platform definition for a supported vendor.
pub fn platform(vendor: Vendor) -> Option<PlatformDefinition> {
    match vendor {
        Vendor::Hirschmann => Some(hirschmann::platform()),
        Vendor::Lantech => Some(lantech::platform()),
        Vendor::Kontron => Some(kontron::platform()),
        Vendor::Nomad => Some(nomad::platform()),
        Vendor::Unknown => None,
    }
}

/// Collector for a supported vendor.
pub fn collector(vendor: Vendor) -> Option<&'static dyn Collector> {
    match vendor {
        Vendor::Hirschmann => Some(&hirschmann::HirschmannCollector),
        Vendor::Lantech => Some(&lantech::LantechCollector),
        Vendor::Kontron => Some(&kontron::KontronCollector),
        Vendor::Nomad => Some(&nomad::NomadCollector),
        Vendor::Unknown => None,
    }
}

/// Identification markers for a vendor; empty for [`Vendor::Unknown`].
pub fn signatures(vendor: Vendor) -> &'static [&'static str] {
    match vendor {
        Vendor::Hirschmann => hirschmann::SIGNATURES,
        Vendor::Lantech => lantech::SIGNATURES,
        Vendor::Kontron => kontron::SIGNATURES,
        Vendor::Nomad => nomad::SIGNATURES,
        Vendor::Unknown => &[],
    }
}

/// Guess a vendor from free text such as an LLDP system description.
///
/// Vendors are checked in probe order; the first whose signature appears
/// (case-insensitively) wins.
pub fn guess_vendor(text: &str) -> Vendor {
    let text = text.to_lowercase();
    Vendor::ALL
        .into_iter()
        .find(|vendor| signatures(*vendor).iter().any(|sig| text.contains(sig)))
        .unwrap_or(Vendor::Unknown)
}
