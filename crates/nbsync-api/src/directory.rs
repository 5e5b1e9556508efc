// ── Remote directory capability ──
//
// The only surface the reconciliation engine sees of the inventory-of-record
// service: four operations per entity collection, exchanging raw JSON
// records. `NetBoxClient` speaks HTTP; `MemoryDirectory` keeps everything
// in process.

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use strum::{Display, EnumIter};

use crate::error::Error;

/// Field map sent on create/update.
pub type Fields = Map<String, Value>;

/// Entity collections exposed by the remote directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Endpoint {
    Regions,
    Sites,
    Manufacturers,
    DeviceRoles,
    DeviceTypes,
    ModuleTypes,
    Devices,
    Interfaces,
    Vlans,
    Prefixes,
    IpAddresses,
}

impl Endpoint {
    /// Application namespace the collection lives under.
    pub fn app(self) -> &'static str {
        match self {
            Self::Vlans | Self::Prefixes | Self::IpAddresses => "ipam",
            _ => "dcim",
        }
    }

    /// Collection path relative to the API root, e.g. `dcim/device-roles/`.
    pub fn path(self) -> String {
        format!("{}/{self}/", self.app())
    }
}

/// Exact-match filter, sent as query parameters.
///
/// Keys follow the REST filter names (`name`, `vid`, `site_id`,
/// `device_id`, …). Order is preserved for stable logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an `key=value` constraint.
    pub fn eq(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// CRUD access to the remote inventory, one collection per [`Endpoint`].
///
/// Implementations return records as raw JSON objects carrying at least an
/// `id`; [`Collection`](crate::Collection) decodes them into typed records.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Every record matching `query`, across all pages.
    async fn find_many(&self, endpoint: Endpoint, query: &Query) -> Result<Vec<Value>, Error>;

    /// Create a record and return it as stored.
    async fn create(&self, endpoint: Endpoint, fields: &Fields) -> Result<Value, Error>;

    /// Partially update record `id` and return it as stored.
    async fn update(&self, endpoint: Endpoint, id: u64, fields: &Fields) -> Result<Value, Error>;

    /// The single record matching `query`, if any.
    ///
    /// More than one match is an [`Error::Ambiguous`], never a silent pick.
    async fn find_one(&self, endpoint: Endpoint, query: &Query) -> Result<Option<Value>, Error> {
        let mut found = self.find_many(endpoint, query).await?;
        match found.len() {
            0 | 1 => Ok(found.pop()),
            count => Err(Error::Ambiguous {
                endpoint,
                query: query.to_string(),
                count,
            }),
        }
    }
}
