// nbsync-core: Reconciliation engine converging declared inventory into NetBox
//
// Reads the declared state (CSV per reference kind, YAML per device),
// resolves cross-references by name, and applies the minimal set of
// idempotent writes through any `nbsync_api::Directory`.

pub mod address;
pub mod desired;
pub mod error;
pub mod iftype;
pub mod kind;
pub mod range;
pub mod reconcile;
pub mod report;
pub mod resolver;
pub mod sync;

pub use error::SyncError;
pub use iftype::{InterfaceType, infer_type};
pub use kind::Kind;
pub use reconcile::{Outcome, Reconciled, Reconciler};
pub use report::{SyncReport, Tally};
pub use resolver::{Resolution, Resolver};
pub use sync::Synchronizer;
