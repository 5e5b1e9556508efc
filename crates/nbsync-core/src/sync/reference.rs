// ── Reference kinds (CSV) ──

use std::path::Path;

use serde_json::{Value, json};
use tracing::warn;

use nbsync_api::records::{
    Device, DeviceRole, DeviceType, Manufacturer, ModuleType, Prefix, Region, Site, Vlan,
};
use nbsync_api::{Endpoint, Query};

use super::{Context, Declared, Synchronizer, fields, read_declared};
use crate::desired::{
    DeviceRoleRow, DeviceRow, DeviceTypeRow, ManufacturerRow, ModuleTypeRow, PrefixRow, RegionRow,
    SiteRow, Tabular, VlanRow,
};
use crate::error::SyncError;
use crate::kind::Kind;
use crate::reconcile::Reconciled;
use crate::resolver::Resolution;

impl Synchronizer<'_> {
    /// Regions may name a parent declared further down the same file, so
    /// rows whose parent is still missing are retried until a pass makes no
    /// progress. Whatever is left (absent parent, parent cycle) is skipped.
    pub(super) async fn sync_regions(&mut self, path: &Path) -> Result<(), SyncError> {
        let Some(rows) = read_declared::<RegionRow>(path)? else {
            return Ok(());
        };

        let mut pending = Vec::new();
        for row in rows {
            match row.record {
                Ok(region) => pending.push(region),
                Err(e) => {
                    self.settle::<Region>(Kind::Region, Err(e))?;
                }
            }
        }

        let mut deferred: Vec<(RegionRow, SyncError)> = Vec::new();
        while !pending.is_empty() {
            let before = pending.len();
            deferred.clear();
            for region in pending {
                match region.apply(self.ctx).await {
                    Err(e @ SyncError::MissingDependency { .. }) => deferred.push((region, e)),
                    result => {
                        self.settle(Kind::Region, result)?;
                    }
                }
            }
            if deferred.len() == before {
                break;
            }
            pending = deferred.drain(..).map(|(region, _)| region).collect();
        }

        for (_, e) in deferred {
            self.settle::<Region>(Kind::Region, Err(e))?;
        }
        Ok(())
    }
}

// ── Field normalisation ─────────────────────────────────────────────

/// Declared status, lower-cased; blank means `active`.
fn status(declared: Option<&str>) -> String {
    declared
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| "active".to_owned(), str::to_lowercase)
}

fn check_vid(record: &impl Tabular, vid: u16) -> Result<u16, SyncError> {
    if (1..=4094).contains(&vid) {
        Ok(vid)
    } else {
        Err(SyncError::malformed(record.label(), "vid", format!("{vid} is outside 1-4094")))
    }
}

/// Fail with every unresolved reference named, or hand back the ids.
fn require<const N: usize>(
    record: &impl Tabular,
    refs: [(Resolution, &str, &str); N],
) -> Result<[u64; N], SyncError> {
    let missing: Vec<String> = refs
        .iter()
        .filter_map(|(resolution, what, value)| resolution.describe(what, value))
        .collect();
    if !missing.is_empty() {
        return Err(SyncError::MissingDependency {
            record: record.label(),
            missing,
        });
    }
    Ok(refs.map(|(resolution, _, _)| resolution.id().unwrap_or_default()))
}

// ── Declarations ────────────────────────────────────────────────────

impl Declared for RegionRow {
    type Record = Region;

    async fn apply(&self, ctx: Context<'_>) -> Result<Reconciled<Region>, SyncError> {
        let parent = match self.parent.as_deref() {
            Some(parent) => {
                let resolution = ctx.resolver.by_name(Endpoint::Regions, parent).await?;
                let [id] = require(self, [(resolution, "parent region", parent)])?;
                Value::from(id)
            }
            None => Value::Null,
        };
        let desired = fields(json!({
            "name": self.name,
            "slug": self.slug,
            "parent": parent,
        }));
        ctx.reconciler
            .reconcile(&Query::new().eq("name", &self.name), desired)
            .await
    }
}

impl Declared for SiteRow {
    type Record = Site;

    async fn apply(&self, ctx: Context<'_>) -> Result<Reconciled<Site>, SyncError> {
        let mut desired = fields(json!({
            "name": self.name,
            "slug": self.slug,
            "status": status(self.status.as_deref()),
        }));

        if let Some(region) = self.region.as_deref() {
            match ctx.resolver.by_name(Endpoint::Regions, region).await? {
                Resolution::Found(id) => {
                    desired.insert("region".into(), Value::from(id));
                }
                unresolved => warn!(
                    site = %self.name,
                    region,
                    ?unresolved,
                    "region not resolved, leaving site region unset"
                ),
            }
        }

        ctx.reconciler
            .reconcile(&Query::new().eq("name", &self.name), desired)
            .await
    }
}

impl Declared for ManufacturerRow {
    type Record = Manufacturer;

    async fn apply(&self, ctx: Context<'_>) -> Result<Reconciled<Manufacturer>, SyncError> {
        let desired = fields(json!({"name": self.name, "slug": self.slug}));
        ctx.reconciler
            .reconcile(&Query::new().eq("name", &self.name), desired)
            .await
    }
}

impl Declared for DeviceRoleRow {
    type Record = DeviceRole;

    async fn apply(&self, ctx: Context<'_>) -> Result<Reconciled<DeviceRole>, SyncError> {
        let color = self.color.trim().trim_start_matches('#').to_ascii_lowercase();
        if color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SyncError::malformed(
                self.label(),
                "color",
                format!("'{}' is not a 6-digit hex colour", self.color),
            ));
        }

        let desired = fields(json!({
            "name": self.name,
            "slug": self.slug,
            "color": color,
        }));
        ctx.reconciler
            .reconcile(&Query::new().eq("name", &self.name), desired)
            .await
    }
}

impl Declared for DeviceTypeRow {
    type Record = DeviceType;

    async fn apply(&self, ctx: Context<'_>) -> Result<Reconciled<DeviceType>, SyncError> {
        let u_height = self.u_height.unwrap_or(1.0);
        if !u_height.is_finite() || u_height < 0.0 {
            return Err(SyncError::malformed(
                self.label(),
                "u_height",
                format!("{u_height} is not a non-negative number"),
            ));
        }

        let manufacturer = ctx
            .resolver
            .by_name(Endpoint::Manufacturers, &self.manufacturer)
            .await?;
        let [manufacturer] = require(
            self,
            [(manufacturer, "manufacturer", self.manufacturer.as_str())],
        )?;

        let desired = fields(json!({
            "manufacturer": manufacturer,
            "model": self.model,
            "slug": self.slug,
            "u_height": u_height,
        }));
        ctx.reconciler
            .reconcile(&Query::new().eq("model", &self.model), desired)
            .await
    }
}

impl Declared for ModuleTypeRow {
    type Record = ModuleType;

    async fn apply(&self, ctx: Context<'_>) -> Result<Reconciled<ModuleType>, SyncError> {
        let manufacturer = ctx
            .resolver
            .by_name(Endpoint::Manufacturers, &self.manufacturer)
            .await?;
        let [manufacturer] = require(
            self,
            [(manufacturer, "manufacturer", self.manufacturer.as_str())],
        )?;

        let desired = fields(json!({"manufacturer": manufacturer, "model": self.model}));
        ctx.reconciler
            .reconcile(&Query::new().eq("model", &self.model), desired)
            .await
    }
}

impl Declared for DeviceRow {
    type Record = Device;

    async fn apply(&self, ctx: Context<'_>) -> Result<Reconciled<Device>, SyncError> {
        let role = ctx.resolver.by_name(Endpoint::DeviceRoles, &self.role).await?;
        let site = ctx.resolver.by_name(Endpoint::Sites, &self.site).await?;
        let device_type = ctx
            .resolver
            .by_model(Endpoint::DeviceTypes, &self.device_type)
            .await?;

        // All three must resolve; a partial set is never written.
        let [role, site, device_type] = require(
            self,
            [
                (role, "role", self.role.as_str()),
                (site, "site", self.site.as_str()),
                (device_type, "device type", self.device_type.as_str()),
            ],
        )?;

        let desired = fields(json!({
            "name": self.name,
            "role": role,
            "site": site,
            "device_type": device_type,
            "status": status(self.status.as_deref()),
        }));
        ctx.reconciler
            .reconcile(&Query::new().eq("name", &self.name), desired)
            .await
    }
}

impl Declared for VlanRow {
    type Record = Vlan;

    async fn apply(&self, ctx: Context<'_>) -> Result<Reconciled<Vlan>, SyncError> {
        let vid = check_vid(self, self.vid)?;
        let site = ctx.resolver.by_name(Endpoint::Sites, &self.site).await?;
        let [site] = require(self, [(site, "site", self.site.as_str())])?;

        let desired = fields(json!({
            "vid": vid,
            "name": self.name,
            "site": site,
            "status": status(self.status.as_deref()),
        }));
        ctx.reconciler
            .reconcile(&Query::new().eq("vid", vid).eq("site_id", site), desired)
            .await
    }
}

impl Declared for PrefixRow {
    type Record = Prefix;

    async fn apply(&self, ctx: Context<'_>) -> Result<Reconciled<Prefix>, SyncError> {
        let mut desired = fields(json!({
            "prefix": self.prefix,
            "status": status(self.status.as_deref()),
            "description": self.description.as_deref().unwrap_or_default(),
        }));

        match self.vlan {
            None => {
                desired.insert("vlan".into(), Value::Null);
            }
            Some(vid) => {
                let vid = check_vid(self, vid)?;
                if let Some(id) = self.vlan_link(ctx, vid).await? {
                    desired.insert("vlan".into(), Value::from(id));
                }
            }
        }

        ctx.reconciler
            .reconcile(&Query::new().eq("prefix", &self.prefix), desired)
            .await
    }
}

impl PrefixRow {
    /// The prefix's VLAN, scoped to its site column when one is given.
    /// Anything unresolved is logged and the link is left out.
    async fn vlan_link(&self, ctx: Context<'_>, vid: u16) -> Result<Option<u64>, SyncError> {
        let site = match self.site.as_deref() {
            None => None,
            Some(site) => match ctx.resolver.by_name(Endpoint::Sites, site).await? {
                Resolution::Found(id) => Some(id),
                unresolved => {
                    warn!(
                        prefix = %self.prefix,
                        site,
                        ?unresolved,
                        "site not resolved, creating prefix without VLAN link"
                    );
                    return Ok(None);
                }
            },
        };

        let resolution = ctx.resolver.vlan(vid, site).await?;
        if resolution.id().is_none() {
            warn!(
                prefix = %self.prefix,
                vid,
                ?resolution,
                "VLAN not resolved, creating prefix without VLAN link"
            );
        }
        Ok(resolution.id())
    }
}
