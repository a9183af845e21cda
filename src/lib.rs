//! IPv6 addressing for a smart campus device inventory.
//!
//! The crate exposes four entry points to whatever view layer sits on top:
//! [`address::synthesize`], [`validate::is_valid_address`],
//! [`store::InventoryStore::add`] and the read side of the store
//! ([`store::InventoryStore::list`] plus its aggregate counters).

pub mod address;
pub mod config;
pub mod models;
pub mod store;
pub mod ui;
pub mod validate;

pub use address::{synthesize, CampusAddress, CAMPUS_PREFIX};
pub use config::InventoryConfig;
pub use models::{DeviceRecord, DeviceStatus, DeviceType, InventoryStats};
pub use store::{BlobStore, InventoryStore, MemoryBlobStore, NativeDbBlobStore};
pub use validate::{classify, is_valid_address, AddressForm};
