pub mod blob;
pub mod device;
pub mod serde_helpers;

pub use blob::StoredBlob;
pub use device::{DeviceRecord, DeviceStatus, DeviceType, InventoryStats};
