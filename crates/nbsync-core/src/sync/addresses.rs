// ── Address pass (interface IPs, primary IPv4, VRRP) ──
//
// Runs after the interface pass: addresses are only bound to interfaces
// that already exist remotely.

use std::collections::HashMap;
use std::path::Path;

use serde_json::json;
use tracing::{debug, error, info, warn};

use nbsync_api::records::{Device, Interface, IpAddress};
use nbsync_api::{Collection, Query, Resource};

use super::{Synchronizer, fields};
use crate::address::cidr;
use crate::desired::{DeviceFile, InterfaceEntry, load_interfaces};
use crate::error::SyncError;
use crate::kind::Kind;
use crate::range::is_range;
use crate::reconcile::Reconciled;

/// Interface whose address becomes the device's primary IPv4.
pub const PRIMARY_INTERFACE: &str = "Loopback0";

/// Object type recorded on every assigned address.
const ASSIGNED_OBJECT_TYPE: &str = "dcim.interface";

impl Synchronizer<'_> {
    /// Assign the addresses declared in every device file under `dir`.
    pub async fn run_addresses(&mut self, dir: &Path, devices: &[String]) {
        let Some(files) = self.device_files(dir, devices) else {
            return;
        };
        for file in files {
            info!(device = %file.device, "syncing addresses");
            if let Err(e) = self.sync_device_addresses(&file).await {
                error!(device = %file.device, error = %e, "address sync aborted for device");
                self.report.fail(Kind::IpAddress);
            }
        }
    }

    async fn sync_device_addresses(&mut self, file: &DeviceFile) -> Result<(), SyncError> {
        let Some(mut device) = self.find_device(file).await? else {
            self.report.skip(Kind::IpAddress);
            return Ok(());
        };
        let declared = load_interfaces(&file.path)?;

        let interfaces: HashMap<String, Interface> =
            Collection::<Interface>::new(self.ctx.directory)
                .find_many(&Query::new().eq("device_id", device.id))
                .await?
                .into_iter()
                .map(|interface| (interface.name.clone(), interface))
                .collect();

        for entry in &declared.interfaces {
            if is_range(&entry.name) {
                debug!(device = %file.device, interface = %entry.name, "range entry, no address");
                continue;
            }
            let Some(interface) = interfaces.get(&entry.name) else {
                debug!(device = %file.device, interface = %entry.name, "interface not present");
                continue;
            };

            if let Some(address) = declared_cidr(entry, entry.ip_address.as_deref()) {
                let role = entry.name.contains("Loopback").then_some("loopback");
                let result = self.assign(interface, &address, role).await;
                let assigned = self.settle(Kind::IpAddress, result)?;

                if let Some(ip) = assigned.filter(|_| entry.name == PRIMARY_INTERFACE) {
                    let result = self.set_primary(device.clone(), &ip).await;
                    if let Some(updated) = self.settle(Kind::Device, result)? {
                        device = updated;
                    }
                }
            }

            if let Some(address) = declared_cidr(entry, entry.vrrp_ip()) {
                let result = self.assign(interface, &address, Some("vrrp")).await;
                self.settle(Kind::IpAddress, result)?;
            }
        }
        Ok(())
    }

    /// Bind `address` to `interface`, creating or correcting the record.
    async fn assign(
        &self,
        interface: &Interface,
        address: &str,
        role: Option<&str>,
    ) -> Result<Reconciled<IpAddress>, SyncError> {
        let desired = fields(json!({
            "address": address,
            "status": "active",
            "role": role,
            "assigned_object_type": ASSIGNED_OBJECT_TYPE,
            "assigned_object_id": interface.id,
        }));
        self.ctx
            .reconciler
            .reconcile(&Query::new().eq("address", address), desired)
            .await
    }

    /// Point the device's primary IPv4 at `ip` unless it already does.
    async fn set_primary(
        &self,
        device: Device,
        ip: &IpAddress,
    ) -> Result<Reconciled<Device>, SyncError> {
        if device.primary_ip4.as_ref().map(|r| r.id) != Some(ip.id) {
            info!(device = %device.label(), address = %ip.address, "setting primary IPv4");
        }
        let desired = fields(json!({"primary_ip4": ip.id}));
        self.ctx.reconciler.converge(Some(device), desired).await
    }
}

/// CIDR form of `address` with the entry's mask; unparsable combinations
/// are logged and yield nothing.
fn declared_cidr(entry: &InterfaceEntry, address: Option<&str>) -> Option<String> {
    let address = address?;
    let Some(mask) = entry.subnet_mask.as_deref() else {
        warn!(interface = %entry.name, address, "address declared without subnet mask");
        return None;
    };
    let cidr = cidr(address, mask);
    if cidr.is_none() {
        warn!(interface = %entry.name, address, mask, "invalid address or mask, skipping");
    }
    cidr
}
