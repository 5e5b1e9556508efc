//! Run orchestration: the reference pass over CSV kinds, then the
//! per-device interface and address passes.
//!
//! Failures are contained at the smallest unit that can absorb them:
//! record-scoped errors skip one row or interface, anything else abandons
//! the current file (reference pass) or device (interface/address passes)
//! and the run moves on.

mod addresses;
mod interfaces;
mod reference;

use std::path::Path;

use serde_json::Value;
use tracing::{Instrument, error, info, info_span, warn};

use nbsync_api::{Collection, Directory, Fields, Query, records::Device};

use crate::desired::{
    DeviceFile, DeviceRoleRow, DeviceRow, DeviceTypeRow, ManufacturerRow, ModuleTypeRow,
    PrefixRow, Row, SiteRow, Tabular, VlanRow, discover, read_rows,
};
use crate::error::SyncError;
use crate::kind::Kind;
use crate::reconcile::{Reconciled, Reconciler};
use crate::report::SyncReport;
use crate::resolver::Resolver;

/// Shared handles every reconciliation step needs.
#[derive(Clone, Copy)]
pub(crate) struct Context<'a> {
    pub directory: &'a dyn Directory,
    pub reconciler: Reconciler<'a>,
    pub resolver: Resolver<'a>,
}

/// Drives reconciliation against one directory and tallies the outcome.
pub struct Synchronizer<'a> {
    ctx: Context<'a>,
    report: SyncReport,
}

impl<'a> Synchronizer<'a> {
    pub fn new(directory: &'a dyn Directory) -> Self {
        Self {
            ctx: Context {
                directory,
                reconciler: Reconciler::new(directory),
                resolver: Resolver::new(directory),
            },
            report: SyncReport::new(),
        }
    }

    pub fn report(&self) -> &SyncReport {
        &self.report
    }

    pub fn into_report(self) -> SyncReport {
        self.report
    }

    // ── Reference pass ───────────────────────────────────────────────

    /// Sync the CSV-declared kinds in dependency order.
    ///
    /// `only` restricts the pass to a subset (order is still fixed); an
    /// empty slice means every kind. A kind that fails is logged and the
    /// next kind still runs.
    pub async fn run_reference(&mut self, csv_dir: &Path, only: &[Kind]) {
        let kinds = Kind::REFERENCE_ORDER
            .into_iter()
            .filter(|k| only.is_empty() || only.contains(k));

        for kind in kinds {
            info!(%kind, "syncing");
            if let Err(e) = self.sync_kind(csv_dir, kind).await {
                error!(%kind, error = %e, "sync aborted, continuing with next kind");
                self.report.fail(kind);
            }
        }
    }

    /// Sync a single CSV-declared kind.
    pub async fn sync_kind(&mut self, csv_dir: &Path, kind: Kind) -> Result<(), SyncError> {
        let Some(file) = kind.csv_file() else {
            return Ok(());
        };
        let path = csv_dir.join(file);

        match kind {
            Kind::Region => self.sync_regions(&path).await,
            Kind::Site => self.sync_rows::<SiteRow>(&path).await,
            Kind::Manufacturer => self.sync_rows::<ManufacturerRow>(&path).await,
            Kind::DeviceRole => self.sync_rows::<DeviceRoleRow>(&path).await,
            Kind::DeviceType => self.sync_rows::<DeviceTypeRow>(&path).await,
            Kind::ModuleType => self.sync_rows::<ModuleTypeRow>(&path).await,
            Kind::Device => self.sync_rows::<DeviceRow>(&path).await,
            Kind::Vlan => self.sync_rows::<VlanRow>(&path).await,
            Kind::Prefix => self.sync_rows::<PrefixRow>(&path).await,
            Kind::Interface | Kind::IpAddress => Ok(()),
        }
    }

    async fn sync_rows<T: Declared>(&mut self, path: &Path) -> Result<(), SyncError> {
        let Some(rows) = read_declared::<T>(path)? else {
            return Ok(());
        };
        for row in rows {
            let span = info_span!("row", line = row.line);
            let result = match row.record {
                Ok(declared) => declared.apply(self.ctx).instrument(span.clone()).await,
                Err(e) => Err(e),
            };
            span.in_scope(|| self.settle(T::KIND, result))?;
        }
        Ok(())
    }

    // ── Per-device passes ────────────────────────────────────────────

    /// Interface files to process, or `None` when the directory is unusable.
    fn device_files(&self, dir: &Path, only: &[String]) -> Option<Vec<DeviceFile>> {
        match discover(dir) {
            Ok(files) => Some(
                files
                    .into_iter()
                    .filter(|f| only.is_empty() || only.contains(&f.device))
                    .collect(),
            ),
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "interface directory unavailable");
                None
            }
        }
    }

    /// Look up the device a file belongs to; logs and returns `None` when
    /// it does not exist.
    async fn find_device(&self, file: &DeviceFile) -> Result<Option<Device>, SyncError> {
        let device = Collection::<Device>::new(self.ctx.directory)
            .find_one(&Query::new().eq("name", &file.device))
            .await?;
        if device.is_none() {
            warn!(device = %file.device, "device not found, skipping file");
        }
        Ok(device)
    }

    // ── Outcome bookkeeping ──────────────────────────────────────────

    /// Tally one result. Record-scoped errors are logged and swallowed;
    /// anything else is handed back to abort the enclosing unit.
    fn settle<R>(
        &mut self,
        kind: Kind,
        result: Result<Reconciled<R>, SyncError>,
    ) -> Result<Option<R>, SyncError> {
        match result {
            Ok(reconciled) => {
                self.report.record(kind, reconciled.outcome);
                Ok(Some(reconciled.record))
            }
            Err(e) if e.is_record_scoped() => {
                error!(%kind, error = %e, "skipped");
                self.report.skip(kind);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// A declaration that knows how to converge itself into the directory.
pub(crate) trait Declared: Tabular {
    type Record: nbsync_api::Resource;

    async fn apply(&self, ctx: Context<'_>) -> Result<Reconciled<Self::Record>, SyncError>;
}

fn read_declared<T: Tabular>(path: &Path) -> Result<Option<Vec<Row<T>>>, SyncError> {
    let rows = read_rows::<T>(path)?;
    if rows.is_none() {
        warn!(kind = %T::KIND, file = %path.display(), "file not found, skipping");
    }
    Ok(rows)
}

/// Unwrap a `json!` object literal into a field map.
fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}
