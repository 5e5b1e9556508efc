// nbsync-api: Async client and typed records for the NetBox REST API

pub mod client;
pub mod collection;
pub mod directory;
pub mod error;
pub mod memory;
pub mod records;
pub mod transport;

pub use client::NetBoxClient;
pub use collection::Collection;
pub use directory::{Directory, Endpoint, Fields, Query};
pub use error::Error;
pub use memory::{MemoryDirectory, Write, WriteOp};
pub use records::{Choice, NestedRef, Resource};
pub use transport::{TlsMode, TransportConfig};
