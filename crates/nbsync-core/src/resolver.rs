// ── Name → id resolution ──
//
// Lookups never fail for an absent record: callers get `Missing` (or
// `Ambiguous` for duplicate names) and choose whether that skips the
// dependent record or merely drops an optional link.

use nbsync_api::{Directory, Endpoint, Query};

use crate::error::SyncError;

/// Result of resolving a human-readable reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Found(u64),
    Missing,
    /// The reference matched this many records.
    Ambiguous(usize),
}

impl Resolution {
    pub fn id(self) -> Option<u64> {
        match self {
            Self::Found(id) => Some(id),
            Self::Missing | Self::Ambiguous(_) => None,
        }
    }

    /// Describe an unresolved reference for logs, or `None` when found.
    pub fn describe(self, what: &str, value: impl std::fmt::Display) -> Option<String> {
        match self {
            Self::Found(_) => None,
            Self::Missing => Some(format!("{what} '{value}'")),
            Self::Ambiguous(count) => Some(format!("{what} '{value}' ({count} matches)")),
        }
    }
}

/// Resolves references by exact name (or vid + site) against the directory.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    directory: &'a dyn Directory,
}

impl<'a> Resolver<'a> {
    pub fn new(directory: &'a dyn Directory) -> Self {
        Self { directory }
    }

    /// Resolve an arbitrary exact-match query.
    pub async fn resolve(&self, endpoint: Endpoint, query: &Query) -> Result<Resolution, SyncError> {
        let found = self.directory.find_many(endpoint, query).await?;
        Ok(match found.as_slice() {
            [] => Resolution::Missing,
            [only] => match only.get("id").and_then(serde_json::Value::as_u64) {
                Some(id) => Resolution::Found(id),
                None => Resolution::Missing,
            },
            many => Resolution::Ambiguous(many.len()),
        })
    }

    /// Resolve a region, site, manufacturer, role or device by `name`.
    pub async fn by_name(&self, endpoint: Endpoint, name: &str) -> Result<Resolution, SyncError> {
        self.resolve(endpoint, &Query::new().eq("name", name)).await
    }

    /// Resolve a device or module type by `model`.
    pub async fn by_model(&self, endpoint: Endpoint, model: &str) -> Result<Resolution, SyncError> {
        self.resolve(endpoint, &Query::new().eq("model", model)).await
    }

    /// Resolve a VLAN by vid, scoped to a site when one is known.
    pub async fn vlan(&self, vid: u16, site: Option<u64>) -> Result<Resolution, SyncError> {
        let mut query = Query::new().eq("vid", vid);
        if let Some(site) = site {
            query = query.eq("site_id", site);
        }
        self.resolve(Endpoint::Vlans, &query).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nbsync_api::MemoryDirectory;
    use serde_json::json;

    #[tokio::test]
    async fn found_missing_and_ambiguous() {
        let dir = MemoryDirectory::new();
        let id = dir.insert(Endpoint::Manufacturers, json!({"name": "Acme", "slug": "acme"}));
        dir.insert(Endpoint::Sites, json!({"name": "Lab", "slug": "lab-a"}));
        dir.insert(Endpoint::Sites, json!({"name": "Lab", "slug": "lab-b"}));

        let resolver = Resolver::new(&dir);
        assert_eq!(
            resolver.by_name(Endpoint::Manufacturers, "Acme").await.unwrap(),
            Resolution::Found(id)
        );
        assert_eq!(
            resolver.by_name(Endpoint::Manufacturers, "Globex").await.unwrap(),
            Resolution::Missing
        );
        assert_eq!(
            resolver.by_name(Endpoint::Sites, "Lab").await.unwrap(),
            Resolution::Ambiguous(2)
        );
    }

    #[tokio::test]
    async fn vlan_is_scoped_to_site() {
        let dir = MemoryDirectory::new();
        let hq = dir.insert(Endpoint::Sites, json!({"name": "HQ", "slug": "hq"}));
        let branch = dir.insert(Endpoint::Sites, json!({"name": "Branch", "slug": "branch"}));
        let hq_vlan = dir.insert(Endpoint::Vlans, json!({"vid": 10, "name": "users", "site": hq}));
        dir.insert(Endpoint::Vlans, json!({"vid": 10, "name": "users", "site": branch}));

        let resolver = Resolver::new(&dir);
        assert_eq!(resolver.vlan(10, Some(hq)).await.unwrap(), Resolution::Found(hq_vlan));
        assert_eq!(resolver.vlan(10, None).await.unwrap(), Resolution::Ambiguous(2));
        assert_eq!(resolver.vlan(20, Some(hq)).await.unwrap(), Resolution::Missing);
    }

    #[test]
    fn describe_unresolved() {
        assert_eq!(Resolution::Found(1).describe("role", "core"), None);
        assert_eq!(
            Resolution::Missing.describe("role", "core").as_deref(),
            Some("role 'core'")
        );
        assert_eq!(
            Resolution::Ambiguous(3).describe("site", "Lab").as_deref(),
            Some("site 'Lab' (3 matches)")
        );
    }
}
