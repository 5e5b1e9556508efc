// ── Per-device interface declarations (YAML) ──

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::error::SyncError;

/// File name suffix of a device's interface declarations.
pub const INTERFACE_FILE_SUFFIX: &str = "_interfaces.yaml";

/// A discovered `<device>_interfaces.yaml` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFile {
    pub device: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct InterfaceFile {
    #[serde(default)]
    pub interfaces: Vec<InterfaceEntry>,
}

/// One declared interface, or a range of identical interfaces.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct InterfaceEntry {
    pub name: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub description: Option<String>,
    #[serde(default)]
    pub shutdown: bool,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub native_vlan: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub access_vlan: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub ip_address: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub subnet_mask: Option<String>,
    #[serde(default)]
    pub vrrp: Option<Vrrp>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Vrrp {
    #[serde(default, deserialize_with = "scalar_text")]
    pub ip: Option<String>,
}

/// Switchport mode as stored on the remote interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortMode {
    Access,
    Tagged,
}

impl PortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Tagged => "tagged",
        }
    }
}

impl InterfaceEntry {
    /// Remote mode and the vid of its untagged VLAN.
    ///
    /// `trunk` maps to tagged with the native VLAN, `access` to access with
    /// the access VLAN; anything else means no mode and no VLAN. A VLAN id
    /// outside 1-4094 fails this entry only.
    pub fn layer2(&self) -> Result<Option<(PortMode, Option<u16>)>, SyncError> {
        let Some(mode) = self.mode.as_deref().map(str::trim) else {
            return Ok(None);
        };
        let (mode, field, vid) = if mode.eq_ignore_ascii_case("trunk") {
            (PortMode::Tagged, "native_vlan", &self.native_vlan)
        } else if mode.eq_ignore_ascii_case("access") {
            (PortMode::Access, "access_vlan", &self.access_vlan)
        } else {
            return Ok(None);
        };
        let vid = vid.as_deref().map(|text| self.vid(field, text)).transpose()?;
        Ok(Some((mode, vid)))
    }

    fn vid(&self, field: &'static str, text: &str) -> Result<u16, SyncError> {
        match text.parse::<u16>() {
            Ok(vid @ 1..=4094) => Ok(vid),
            _ => Err(SyncError::malformed(
                self.name.clone(),
                field,
                format!("invalid VLAN id '{text}' (expected 1-4094)"),
            )),
        }
    }

    /// Virtual (VRRP) address, when declared.
    pub fn vrrp_ip(&self) -> Option<&str> {
        self.vrrp.as_ref()?.ip.as_deref()
    }
}

// ── Field decoders ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Int(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// Any YAML scalar as trimmed text; blank and null are `None`.
fn scalar_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Scalar>::deserialize(de)?;
    Ok(value
        .map(|s| s.into_text().trim().to_owned())
        .filter(|s| !s.is_empty()))
}

// ── Loading ─────────────────────────────────────────────────────────

/// List device interface files in `dir`, sorted by device name.
pub fn discover(dir: &Path) -> Result<Vec<DeviceFile>, SyncError> {
    let read_err = |source| SyncError::Read {
        path: dir.to_owned(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_file() {
            continue;
        }
        let Some(device) = path
            .file_name()
            .and_then(|f| f.to_str())
            .and_then(|f| f.strip_suffix(INTERFACE_FILE_SUFFIX))
            .filter(|d| !d.is_empty())
        else {
            continue;
        };
        files.push(DeviceFile {
            device: device.to_owned(),
            path,
        });
    }
    files.sort_by(|a, b| a.device.cmp(&b.device));
    Ok(files)
}

/// Load one device's interface declarations. An empty file declares none.
pub fn load_interfaces(path: &Path) -> Result<InterfaceFile, SyncError> {
    let content = std::fs::read_to_string(path).map_err(|source| SyncError::Read {
        path: path.to_owned(),
        source,
    })?;
    parse_interfaces(&content, path)
}

pub fn parse_interfaces(content: &str, source: &Path) -> Result<InterfaceFile, SyncError> {
    if content.trim().is_empty() {
        return Ok(InterfaceFile::default());
    }
    let file: Option<InterfaceFile> =
        serde_yaml::from_str(content).map_err(|e| SyncError::Parse {
            path: source.to_owned(),
            reason: e.to_string(),
        })?;
    Ok(file.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(content: &str) -> InterfaceFile {
        parse_interfaces(content, Path::new("r1_interfaces.yaml")).unwrap()
    }

    #[test]
    fn full_entry() {
        let file = parse(
            r#"
interfaces:
  - name: GigabitEthernet0/1
    description: uplink
    shutdown: true
    mode: Trunk
    native_vlan: "99"
    ip_address: 10.0.0.1
    subnet_mask: 255.255.255.0
    vrrp:
      ip: 10.0.0.254
"#,
        );

        let entry = &file.interfaces[0];
        assert_eq!(entry.description.as_deref(), Some("uplink"));
        assert!(entry.shutdown);
        assert_eq!(entry.layer2().unwrap(), Some((PortMode::Tagged, Some(99))));
        assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(entry.subnet_mask.as_deref(), Some("255.255.255.0"));
        assert_eq!(entry.vrrp_ip(), Some("10.0.0.254"));
    }

    #[test]
    fn sparse_entry_defaults() {
        let file = parse("interfaces:\n  - name: Loopback0\n    subnet_mask: 32\n");
        let entry = &file.interfaces[0];
        assert!(!entry.shutdown);
        assert_eq!(entry.description, None);
        assert_eq!(entry.layer2().unwrap(), None);
        assert_eq!(entry.subnet_mask.as_deref(), Some("32"));
        assert_eq!(entry.vrrp_ip(), None);
    }

    #[test]
    fn access_mode_uses_access_vlan() {
        let file = parse("interfaces:\n  - {name: Gi0/2, mode: access, access_vlan: 10, native_vlan: 20}\n");
        assert_eq!(file.interfaces[0].layer2().unwrap(), Some((PortMode::Access, Some(10))));
    }

    #[test]
    fn unknown_mode_means_no_layer2() {
        let file = parse("interfaces:\n  - {name: Gi0/3, mode: routed, access_vlan: 10}\n");
        assert_eq!(file.interfaces[0].layer2().unwrap(), None);
    }

    #[test]
    fn bad_vid_fails_only_its_entry() {
        let file = parse(
            "interfaces:\n  - {name: Gi0/4, mode: access, access_vlan: 5000}\n  - {name: Gi0/5, mode: trunk, native_vlan: abc}\n  - {name: Gi0/6, mode: access, access_vlan: 4094}\n",
        );

        let err = file.interfaces[0].layer2().unwrap_err();
        assert!(err.is_record_scoped());
        assert!(err.to_string().contains("5000"), "{err}");
        assert!(err.to_string().contains("access_vlan"), "{err}");

        let err = file.interfaces[1].layer2().unwrap_err();
        assert!(err.to_string().contains("native_vlan"), "{err}");

        assert_eq!(
            file.interfaces[2].layer2().unwrap(),
            Some((PortMode::Access, Some(4094)))
        );
    }

    #[test]
    fn empty_documents_declare_nothing() {
        assert_eq!(parse(""), InterfaceFile::default());
        assert_eq!(parse("---\n"), InterfaceFile::default());
        assert_eq!(parse("interfaces: []\n"), InterfaceFile::default());
    }

    #[test]
    fn discover_sorts_and_strips_suffix() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["sw2_interfaces.yaml", "r1_interfaces.yaml", "notes.txt", "_interfaces.yaml"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let devices: Vec<String> = discover(dir.path())
            .unwrap()
            .into_iter()
            .map(|f| f.device)
            .collect();
        assert_eq!(devices, vec!["r1", "sw2"]);
    }

    #[test]
    fn discover_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("absent")).is_err());
    }
}
