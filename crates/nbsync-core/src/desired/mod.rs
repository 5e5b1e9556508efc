//! Declared (desired) state: one CSV file per reference kind plus one
//! YAML document of interfaces per device.

pub mod interfaces;
pub mod tabular;

pub use interfaces::{
    DeviceFile, INTERFACE_FILE_SUFFIX, InterfaceEntry, InterfaceFile, PortMode, Vrrp, discover,
    load_interfaces,
};
pub use tabular::{
    DeviceRoleRow, DeviceRow, DeviceTypeRow, ManufacturerRow, ModuleTypeRow, PrefixRow, RegionRow,
    Row, SiteRow, Tabular, VlanRow, read_rows,
};
