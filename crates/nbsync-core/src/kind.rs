// ── Entity kinds ──

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use nbsync_api::Endpoint;

/// Every entity kind the engine reconciles.
///
/// Declaration order is dependency order: a kind only references kinds
/// declared before it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
    Serialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    Region,
    Site,
    Manufacturer,
    DeviceRole,
    DeviceType,
    ModuleType,
    Device,
    Vlan,
    Prefix,
    Interface,
    IpAddress,
}

impl Kind {
    /// Kinds declared in tabular files, in the order they must be synced.
    pub const REFERENCE_ORDER: [Kind; 9] = [
        Kind::Region,
        Kind::Site,
        Kind::Manufacturer,
        Kind::DeviceRole,
        Kind::DeviceType,
        Kind::ModuleType,
        Kind::Device,
        Kind::Vlan,
        Kind::Prefix,
    ];

    /// CSV file holding this kind's declarations, if it has one.
    ///
    /// Interfaces and IP addresses are declared per device in YAML instead.
    pub fn csv_file(self) -> Option<&'static str> {
        Some(match self {
            Self::Region => "regions.csv",
            Self::Site => "sites.csv",
            Self::Manufacturer => "manufacturers.csv",
            Self::DeviceRole => "device_roles.csv",
            Self::DeviceType => "device_types.csv",
            Self::ModuleType => "module_types.csv",
            Self::Device => "devices.csv",
            Self::Vlan => "vlans.csv",
            Self::Prefix => "prefixes.csv",
            Self::Interface | Self::IpAddress => return None,
        })
    }

    /// Remote collection backing this kind.
    pub fn endpoint(self) -> Endpoint {
        match self {
            Self::Region => Endpoint::Regions,
            Self::Site => Endpoint::Sites,
            Self::Manufacturer => Endpoint::Manufacturers,
            Self::DeviceRole => Endpoint::DeviceRoles,
            Self::DeviceType => Endpoint::DeviceTypes,
            Self::ModuleType => Endpoint::ModuleTypes,
            Self::Device => Endpoint::Devices,
            Self::Vlan => Endpoint::Vlans,
            Self::Prefix => Endpoint::Prefixes,
            Self::Interface => Endpoint::Interfaces,
            Self::IpAddress => Endpoint::IpAddresses,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn reference_order_follows_declaration_order() {
        let mut sorted = Kind::REFERENCE_ORDER;
        sorted.sort();
        assert_eq!(sorted, Kind::REFERENCE_ORDER);
    }

    #[test]
    fn only_yaml_kinds_lack_a_csv_file() {
        let without: Vec<Kind> = Kind::iter().filter(|k| k.csv_file().is_none()).collect();
        assert_eq!(without, vec![Kind::Interface, Kind::IpAddress]);
    }

    #[test]
    fn parses_kebab_case_names() {
        assert_eq!("device-role".parse::<Kind>().unwrap(), Kind::DeviceRole);
        assert_eq!("VLAN".parse::<Kind>().unwrap(), Kind::Vlan);
        assert_eq!(Kind::IpAddress.to_string(), "ip-address");
    }
}
