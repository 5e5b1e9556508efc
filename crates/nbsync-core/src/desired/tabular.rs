// ── Tabular declarations (one CSV per entity kind) ──

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::SyncError;
use crate::kind::Kind;

/// A row type declared in its kind's CSV file.
pub trait Tabular: DeserializeOwned {
    const KIND: Kind;

    /// Columns every file of this kind must carry.
    const COLUMNS: &'static [&'static str];

    /// Identity of the declared record, for logs.
    fn label(&self) -> String;
}

/// One data row: its 1-based line number and the decoded declaration.
///
/// A row that fails to decode carries a record-scoped
/// [`SyncError::Malformed`] so the rest of the file still runs.
#[derive(Debug)]
pub struct Row<T> {
    pub line: usize,
    pub record: Result<T, SyncError>,
}

// ── Row types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RegionRow {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SiteRow {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ManufacturerRow {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeviceRoleRow {
    pub name: String,
    pub slug: String,
    pub color: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeviceTypeRow {
    pub manufacturer: String,
    pub model: String,
    pub slug: String,
    #[serde(default)]
    pub u_height: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModuleTypeRow {
    pub manufacturer: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeviceRow {
    pub name: String,
    pub role: String,
    pub site: String,
    pub device_type: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VlanRow {
    pub vid: u16,
    pub name: String,
    pub site: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PrefixRow {
    pub prefix: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// VLAN vid the prefix belongs to.
    #[serde(default)]
    pub vlan: Option<u16>,
    /// Site scoping the VLAN lookup.
    #[serde(default)]
    pub site: Option<String>,
}

macro_rules! tabular {
    ($row:ty, $kind:expr, [$($col:literal),+], |$r:ident| $label:expr) => {
        impl Tabular for $row {
            const KIND: Kind = $kind;
            const COLUMNS: &'static [&'static str] = &[$($col),+];

            fn label(&self) -> String {
                let $r = self;
                $label
            }
        }
    };
}

tabular!(RegionRow, Kind::Region, ["name", "slug"], |r| r.name.clone());
tabular!(SiteRow, Kind::Site, ["name", "slug"], |r| r.name.clone());
tabular!(ManufacturerRow, Kind::Manufacturer, ["name", "slug"], |r| r.name.clone());
tabular!(DeviceRoleRow, Kind::DeviceRole, ["name", "slug", "color"], |r| r.name.clone());
tabular!(
    DeviceTypeRow,
    Kind::DeviceType,
    ["manufacturer", "model", "slug"],
    |r| r.model.clone()
);
tabular!(ModuleTypeRow, Kind::ModuleType, ["manufacturer", "model"], |r| r.model.clone());
tabular!(
    DeviceRow,
    Kind::Device,
    ["name", "role", "site", "device_type"],
    |r| r.name.clone()
);
tabular!(VlanRow, Kind::Vlan, ["vid", "name", "site"], |r| format!(
    "VLAN {} @ {}",
    r.vid, r.site
));
tabular!(PrefixRow, Kind::Prefix, ["prefix", "description", "vlan"], |r| r
    .prefix
    .clone());

// ── Loading ─────────────────────────────────────────────────────────

/// Read every row of a kind's CSV file.
///
/// Returns `Ok(None)` when the file does not exist; a file missing one of
/// the kind's required columns is an error for the whole file.
pub fn read_rows<T: Tabular>(path: &Path) -> Result<Option<Vec<Row<T>>>, SyncError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SyncError::Read {
                path: path.to_owned(),
                source,
            });
        }
    };
    parse_rows(&content, path).map(Some)
}

/// Parse CSV `content`; `source` is only used in messages.
pub fn parse_rows<T: Tabular>(content: &str, source: &Path) -> Result<Vec<Row<T>>, SyncError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = rdr.headers().map_err(|e| SyncError::Parse {
        path: source.to_owned(),
        reason: e.to_string(),
    })?;
    let present: HashSet<&str> = headers.iter().collect();
    let missing: Vec<&str> = T::COLUMNS
        .iter()
        .copied()
        .filter(|col| !present.contains(col))
        .collect();
    if !missing.is_empty() {
        return Err(SyncError::Parse {
            path: source.to_owned(),
            reason: format!("missing required columns: {}", missing.join(", ")),
        });
    }

    let file = source
        .file_name()
        .map_or_else(|| source.display().to_string(), |f| f.to_string_lossy().into_owned());

    Ok(rdr
        .deserialize::<T>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // header is line 1
            Row {
                line,
                record: result
                    .map_err(|e| SyncError::malformed(format!("{file}:{line}"), "row", e)),
            }
        })
        .collect())
}
