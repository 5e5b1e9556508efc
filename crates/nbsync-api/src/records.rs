// ── Typed remote records ──
//
// Fixed-shape views of what the directory returns. Foreign keys and choice
// fields arrive either nested (`{"id": 3, ...}`, `{"value": "active", ...}`)
// or flat (`3`, `"active"`); both decode to the same types, and optional
// references are a plain `None` when unset.

use serde::{Deserialize, Deserializer, Serialize};

use crate::directory::Endpoint;

/// A record type stored in one remote collection.
pub trait Resource: Serialize + serde::de::DeserializeOwned + Send + Sync {
    const ENDPOINT: Endpoint;

    /// Remote-assigned identifier.
    fn id(&self) -> u64;

    /// Human-readable identity used in logs (name, model, CIDR, …).
    fn label(&self) -> String;
}

// ── Field shapes ────────────────────────────────────────────────────

/// Reference to another remote record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedRef {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl NestedRef {
    pub fn new(id: u64) -> Self {
        Self { id, display: None }
    }
}

impl<'de> Deserialize<'de> for NestedRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(u64),
            Nested {
                id: u64,
                #[serde(default)]
                display: Option<String>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Id(id) => Self::new(id),
            Raw::Nested { id, display } => Self { id, display },
        })
    }
}

/// Enumerated field (status, interface type, mode, role).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Choice {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl<'de> Deserialize<'de> for Choice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Plain(String),
            Nested {
                value: String,
                #[serde(default)]
                label: Option<String>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Plain(value) => Self::new(value),
            Raw::Nested { value, label } => Self { value, label },
        })
    }
}

// ── Organisation ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent: Option<NestedRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub status: Option<Choice>,
    #[serde(default)]
    pub region: Option<NestedRef>,
}

// ── Device catalogue ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRole {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceType {
    pub id: u64,
    pub model: String,
    pub slug: String,
    pub manufacturer: NestedRef,
    #[serde(default = "default_u_height")]
    pub u_height: f64,
}

fn default_u_height() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleType {
    pub id: u64,
    pub model: String,
    pub manufacturer: NestedRef,
}

// ── Devices and their ports ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "device_role")]
    pub role: Option<NestedRef>,
    pub site: NestedRef,
    pub device_type: NestedRef,
    #[serde(default)]
    pub status: Option<Choice>,
    #[serde(default)]
    pub primary_ip4: Option<NestedRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interface {
    pub id: u64,
    pub name: String,
    pub device: NestedRef,
    #[serde(rename = "type")]
    pub kind: Choice,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub mode: Option<Choice>,
    #[serde(default)]
    pub untagged_vlan: Option<NestedRef>,
}

fn default_enabled() -> bool {
    true
}

// ── IPAM ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vlan {
    pub id: u64,
    pub vid: u16,
    pub name: String,
    #[serde(default)]
    pub site: Option<NestedRef>,
    #[serde(default)]
    pub status: Option<Choice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prefix {
    pub id: u64,
    pub prefix: String,
    #[serde(default)]
    pub status: Option<Choice>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vlan: Option<NestedRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpAddress {
    pub id: u64,
    pub address: String,
    #[serde(default)]
    pub status: Option<Choice>,
    #[serde(default)]
    pub role: Option<Choice>,
    #[serde(default)]
    pub assigned_object_type: Option<String>,
    #[serde(default)]
    pub assigned_object_id: Option<u64>,
}

// ── Resource impls ──────────────────────────────────────────────────

macro_rules! resource {
    ($ty:ty, $endpoint:expr, |$rec:ident| $label:expr) => {
        impl Resource for $ty {
            const ENDPOINT: Endpoint = $endpoint;

            fn id(&self) -> u64 {
                self.id
            }

            fn label(&self) -> String {
                let $rec = self;
                $label
            }
        }
    };
}

resource!(Region, Endpoint::Regions, |r| r.name.clone());
resource!(Site, Endpoint::Sites, |r| r.name.clone());
resource!(Manufacturer, Endpoint::Manufacturers, |r| r.name.clone());
resource!(DeviceRole, Endpoint::DeviceRoles, |r| r.name.clone());
resource!(DeviceType, Endpoint::DeviceTypes, |r| r.model.clone());
resource!(ModuleType, Endpoint::ModuleTypes, |r| r.model.clone());
resource!(Device, Endpoint::Devices, |r| r
    .name
    .clone()
    .unwrap_or_else(|| format!("device #{}", r.id)));
resource!(Interface, Endpoint::Interfaces, |r| r.name.clone());
resource!(Vlan, Endpoint::Vlans, |r| format!("{} ({})", r.vid, r.name));
resource!(Prefix, Endpoint::Prefixes, |r| r.prefix.clone());
resource!(IpAddress, Endpoint::IpAddresses, |r| r.address.clone());
