// ── Interface pass ──

use std::collections::HashMap;
use std::path::Path;

use serde_json::json;
use tracing::{error, info, warn};

use nbsync_api::records::{Device, Interface};
use nbsync_api::{Collection, Query, Resource};

use super::{Synchronizer, fields};
use crate::desired::{DeviceFile, InterfaceEntry, PortMode, load_interfaces};
use crate::error::SyncError;
use crate::iftype::infer_type;
use crate::kind::Kind;
use crate::range::expand;
use crate::reconcile::Reconciled;

/// Mode and untagged VLAN shared by every name an entry expands to.
struct Layer2 {
    mode: Option<PortMode>,
    untagged_vlan: Option<u64>,
}

impl Synchronizer<'_> {
    /// Converge the interfaces declared in every device file under `dir`.
    ///
    /// `devices` restricts the pass to those names; empty means all. A
    /// device that fails is logged and the next one still runs.
    pub async fn run_interfaces(&mut self, dir: &Path, devices: &[String]) {
        let Some(files) = self.device_files(dir, devices) else {
            return;
        };
        for file in files {
            info!(device = %file.device, "syncing interfaces");
            if let Err(e) = self.sync_device_interfaces(&file).await {
                error!(device = %file.device, error = %e, "interface sync aborted for device");
                self.report.fail(Kind::Interface);
            }
        }
    }

    async fn sync_device_interfaces(&mut self, file: &DeviceFile) -> Result<(), SyncError> {
        let Some(device) = self.find_device(file).await? else {
            self.report.skip(Kind::Interface);
            return Ok(());
        };
        let declared = load_interfaces(&file.path)?;

        let mut existing: HashMap<String, Interface> =
            Collection::<Interface>::new(self.ctx.directory)
                .find_many(&Query::new().eq("device_id", device.id))
                .await?
                .into_iter()
                .map(|interface| (interface.name.clone(), interface))
                .collect();

        for entry in &declared.interfaces {
            let names = match expand(&entry.name) {
                Ok(names) => names,
                Err(e) => {
                    self.settle::<Interface>(Kind::Interface, Err(e))?;
                    continue;
                }
            };
            let layer2 = match self.layer2(&device, entry).await {
                Ok(layer2) => layer2,
                Err(e) => {
                    self.settle::<Interface>(Kind::Interface, Err(e))?;
                    continue;
                }
            };

            for name in names {
                let current = existing.remove(&name);
                let result = self
                    .converge_interface(&device, entry, &layer2, &name, current)
                    .await;
                if let Some(interface) = self.settle(Kind::Interface, result)? {
                    existing.insert(name, interface);
                }
            }
        }
        Ok(())
    }

    /// Resolve an entry's untagged VLAN within the device's site. An
    /// unknown VLAN is logged and the interface is written without one.
    async fn layer2(&self, device: &Device, entry: &InterfaceEntry) -> Result<Layer2, SyncError> {
        let Some((mode, vid)) = entry.layer2()? else {
            return Ok(Layer2 {
                mode: None,
                untagged_vlan: None,
            });
        };

        let untagged_vlan = match vid {
            None => None,
            Some(vid) => {
                let resolution = self.ctx.resolver.vlan(vid, Some(device.site.id)).await?;
                if resolution.id().is_none() {
                    warn!(
                        device = %device.label(),
                        interface = %entry.name,
                        vid,
                        ?resolution,
                        "VLAN not found in device site, leaving untagged VLAN unset"
                    );
                }
                resolution.id()
            }
        };

        Ok(Layer2 {
            mode: Some(mode),
            untagged_vlan,
        })
    }

    async fn converge_interface(
        &self,
        device: &Device,
        entry: &InterfaceEntry,
        layer2: &Layer2,
        name: &str,
        current: Option<Interface>,
    ) -> Result<Reconciled<Interface>, SyncError> {
        let kind = infer_type(name)?;
        let desired = fields(json!({
            "device": device.id,
            "name": name,
            "type": kind.as_str(),
            "description": entry.description.as_deref().unwrap_or_default(),
            "enabled": !entry.shutdown,
            "mode": layer2.mode.map(PortMode::as_str),
            "untagged_vlan": layer2.untagged_vlan,
        }));
        self.ctx.reconciler.converge(current, desired).await
    }
}
