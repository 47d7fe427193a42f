//! Platform registry for looking up vendor platform definitions.

use indexmap::IndexMap;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::{PlatformError, Result};
use crate::model::Vendor;

/// Registry for platform definitions, one per vendor.
///
/// Each discovery run owns its registry, so tests can swap a vendor's
/// prompt or identification without touching other runs.
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    platforms: IndexMap<Vendor, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: IndexMap::new(),
        }
    }

    /// Create a registry holding every built-in vendor platform.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for vendor in Vendor::ALL {
            if let Some(platform) = vendors::platform(vendor) {
                registry.register(platform);
            }
        }
        registry
    }

    /// Register a platform definition, replacing any earlier one for the
    /// same vendor.
    pub fn register(&mut self, platform: PlatformDefinition) -> Option<PlatformDefinition> {
        self.platforms.insert(platform.vendor, platform)
    }

    /// Get a platform by vendor.
    pub fn get(&self, vendor: Vendor) -> Option<&PlatformDefinition> {
        self.platforms.get(&vendor)
    }

    /// Get a platform by vendor, failing if it is not registered.
    pub fn require(&self, vendor: Vendor) -> Result<&PlatformDefinition> {
        self.get(vendor).ok_or_else(|| {
            PlatformError::UnknownPlatform {
                name: vendor.to_string(),
            }
            .into()
        })
    }

    /// Check if a platform is registered.
    pub fn contains(&self, vendor: Vendor) -> bool {
        self.platforms.contains_key(&vendor)
    }

    /// Get a mutable reference to a platform.
    pub fn get_mut(&mut self, vendor: Vendor) -> Option<&mut PlatformDefinition> {
        self.platforms.get_mut(&vendor)
    }

    /// Registered vendors, in registration order.
    pub fn vendors(&self) -> impl Iterator<Item = Vendor> + '_ {
        self.platforms.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_every_vendor() {
        let registry = PlatformRegistry::builtin();
        assert_eq!(registry.vendors().collect::<Vec<_>>(), Vendor::ALL.to_vec());
        assert!(!registry.contains(Vendor::Unknown));
        assert!(registry.require(Vendor::Unknown).is_err());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = PlatformRegistry::builtin();
        let custom = PlatformDefinition::new(Vendor::Nomad, r"custom>")
            .unwrap()
            .with_identify_command("show system");
        assert!(registry.register(custom).is_some());
        assert_eq!(
            registry.get(Vendor::Nomad).unwrap().identification.command,
            "show system"
        );
    }
}
