//! Inventory storage: an append-only device sequence mirrored to a single persisted
//! key-value entry.

use anyhow::{anyhow, Result};
use chrono::Utc;
use native_db::{Builder, Database, Models};
use once_cell::sync::OnceCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::models::device::registered_now;
use crate::models::{DeviceRecord, DeviceStatus, DeviceType, InventoryStats, StoredBlob};

/// Key the browser tool stored its inventory under.
pub const DEFAULT_STORAGE_KEY: &str = "campusDevices";

/// Demonstration devices appended when a freshly hydrated inventory is empty.
pub const SEED_DEVICES: [(&str, &str, &str); 3] = [
    ("Main Gateway", "gateway", "2001:db8:cafe:1:1::0003:0001"),
    ("Temperature Sensor 1", "sensor", "2001:db8:cafe:1:2::0001:0002"),
    ("Security Camera A", "camera", "2001:db8:cafe:1:3::0002:0003"),
];

// ===== PERSISTENCE BACKENDS =====

/// Key-value persistence for serialized inventories.
pub trait BlobStore {
    /// Returns the value stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replaces whatever is stored under `key`.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<B: BlobStore + ?Sized> BlobStore for &mut B {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }
}

/// Process-local backend, used for tests and for embedding without a database file.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    entries: HashMap<String, String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

static MODELS: OnceCell<Models> = OnceCell::new();

fn models() -> Result<&'static Models> {
    MODELS.get_or_try_init(|| -> Result<Models> {
        let mut models = Models::new();
        models
            .define::<StoredBlob>()
            .map_err(|e| anyhow!("Failed to define StoredBlob model: {}", e))?;
        Ok(models)
    })
}

/// Embedded native_db database holding one [`StoredBlob`] row per key.
pub struct NativeDbBlobStore {
    database: Database<'static>,
}

impl std::fmt::Debug for NativeDbBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeDbBlobStore").finish_non_exhaustive()
    }
}

impl NativeDbBlobStore {
    /// Opens the database file at `path`, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let database = Builder::new()
            .create(models()?, path)
            .map_err(|e| anyhow!("Failed to open inventory database {}: {}", path.display(), e))?;
        tracing::debug!("Opened inventory database at {}", path.display());
        Ok(Self { database })
    }

    pub fn in_memory() -> Result<Self> {
        let database = Builder::new()
            .create_in_memory(models()?)
            .map_err(|e| anyhow!("Failed to create in-memory inventory database: {}", e))?;
        Ok(Self { database })
    }
}

impl BlobStore for NativeDbBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let r = self.database.r_transaction()?;
        let blob: Option<StoredBlob> = r.get().primary(key.to_string())?;
        Ok(blob.map(|blob| blob.value))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let rw = self.database.rw_transaction()?;
        rw.upsert(StoredBlob::new(key.to_string(), value.to_string()))?;
        rw.commit()?;
        Ok(())
    }
}

// ===== INVENTORY =====

/// Reads and parses the inventory stored under `key`.
///
/// A missing or empty entry is an empty inventory. A corrupt entry is reported on the
/// `tracing` error channel and also treated as empty.
pub fn load_devices<B: BlobStore>(backend: &B, key: &str) -> Result<Vec<DeviceRecord>> {
    let stored = match backend.read(key)? {
        Some(stored) if !stored.trim().is_empty() => stored,
        _ => return Ok(Vec::new()),
    };

    match serde_json::from_str::<Vec<DeviceRecord>>(&stored) {
        Ok(devices) => Ok(devices),
        Err(e) => {
            tracing::error!(
                "Stored inventory under '{}' is corrupt, starting empty: {}",
                key,
                e
            );
            Ok(Vec::new())
        }
    }
}

/// The campus device inventory.
///
/// Records are only ever appended; every append rewrites the persisted entry with the full
/// sequence.
pub struct InventoryStore<B: BlobStore> {
    backend: B,
    key: String,
    devices: Vec<DeviceRecord>,
}

impl<B: BlobStore> InventoryStore<B> {
    /// Creates a store hydrated from whatever `backend` holds under `key`.
    pub fn open(backend: B, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let devices = load_devices(&backend, &key)?;
        tracing::info!("Loaded {} devices from '{}'", devices.len(), key);
        Ok(Self {
            backend,
            key,
            devices,
        })
    }

    /// Re-reads the persisted inventory without touching the in-memory sequence.
    pub fn load(&self) -> Result<Vec<DeviceRecord>> {
        load_devices(&self.backend, &self.key)
    }

    /// Writes the full in-memory sequence to the backend.
    pub fn save(&mut self) -> Result<()> {
        let serialized = serde_json::to_string(&self.devices)?;
        self.backend.write(&self.key, &serialized)?;
        tracing::debug!("Saved {} devices to '{}'", self.devices.len(), self.key);
        Ok(())
    }

    /// Registers an online device.
    pub fn add(&mut self, name: &str, device_type: &str, address: &str) -> Result<DeviceRecord> {
        self.add_with_status(name, device_type, address, DeviceStatus::Online)
    }

    /// Registers a device with an explicit status. The record is appended before saving, so it
    /// stays in memory even if persisting fails.
    pub fn add_with_status(
        &mut self,
        name: &str,
        device_type: &str,
        address: &str,
        status: DeviceStatus,
    ) -> Result<DeviceRecord> {
        let device = DeviceRecord::new(
            self.next_id()?,
            name.to_string(),
            device_type.to_string(),
            address.to_string(),
            status,
            registered_now(),
        );
        self.devices.push(device.clone());
        self.save()?;
        Ok(device)
    }

    // Millisecond clock, bumped past the newest id so ids stay distinct.
    fn next_id(&self) -> Result<i64> {
        let now = Utc::now().timestamp_millis();
        let last = match self.devices.iter().map(|device| device.id).max() {
            Some(last) if last >= now => last,
            _ => return Ok(now),
        };
        if let Some(id) = last.checked_add(1) {
            return Ok(id);
        }

        // Top of the id range is taken: use the first free id at or after the clock.
        let taken: HashSet<i64> = self.devices.iter().map(|device| device.id).collect();
        (now..=i64::MAX)
            .find(|id| !taken.contains(id))
            .ok_or_else(|| anyhow!("No free device id left in '{}'", self.key))
    }

    /// Devices in insertion order, most recent last.
    pub fn list(&self) -> &[DeviceRecord] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<&DeviceRecord>
    where
        P: Fn(&DeviceRecord) -> bool,
    {
        self.devices.iter().filter(|device| predicate(*device)).collect()
    }

    pub fn filter_by_status(&self, status: DeviceStatus) -> Vec<&DeviceRecord> {
        self.filter(|device| device.status == status)
    }

    pub fn count_by_status(&self, status: DeviceStatus) -> usize {
        self.devices
            .iter()
            .filter(|device| device.status == status)
            .count()
    }

    /// Counts devices whose stored type equals `device_type` exactly, or differs from it when
    /// `negate` is set.
    pub fn count_by_type(&self, device_type: &str, negate: bool) -> usize {
        self.devices
            .iter()
            .filter(|device| (device.device_type == device_type) != negate)
            .count()
    }

    pub fn stats(&self) -> InventoryStats {
        let sensor = DeviceType::Sensor.as_str();
        InventoryStats {
            total: self.devices.len(),
            online: self.count_by_status(DeviceStatus::Online),
            sensors: self.count_by_type(sensor, false),
            non_sensors: self.count_by_type(sensor, true),
        }
    }

    /// Appends [`SEED_DEVICES`] when the inventory is empty. Returns whether seeding happened.
    pub fn seed_if_empty(&mut self) -> Result<bool> {
        if !self.devices.is_empty() {
            return Ok(false);
        }
        for (name, device_type, address) in SEED_DEVICES {
            self.add(name, device_type, address)?;
        }
        tracing::info!("Seeded empty inventory with {} devices", SEED_DEVICES.len());
        Ok(true)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_store() -> InventoryStore<MemoryBlobStore> {
        InventoryStore::open(MemoryBlobStore::new(), DEFAULT_STORAGE_KEY)
            .expect("memory store must open")
    }

    #[test]
    fn test_open_without_entry_is_empty() {
        let store = empty_store();
        assert!(store.is_empty());
        assert_eq!(store.list().len(), 0);
        assert_eq!(store.key(), "campusDevices");
    }

    #[test]
    fn test_corrupt_blob_loads_as_empty() {
        for corrupt in ["{not json", "{\"id\":1}", "[{\"name\":\"missing fields\"}]", "null"] {
            let backend = MemoryBlobStore::with_entry(DEFAULT_STORAGE_KEY, corrupt);
            let store = InventoryStore::open(backend, DEFAULT_STORAGE_KEY).unwrap();
            assert!(store.is_empty(), "{:?} should load as empty", corrupt);
        }
    }

    #[test]
    fn test_blank_blob_loads_as_empty() {
        let backend = MemoryBlobStore::with_entry(DEFAULT_STORAGE_KEY, "");
        let store = InventoryStore::open(backend, DEFAULT_STORAGE_KEY).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_appends_and_defaults_to_online() {
        let mut store = empty_store();
        let first = store.add("Lobby Camera", "camera", "2001:db8:cafe:01:02::0002:1A2B").unwrap();
        let second = store
            .add_with_status("Roof Sensor", "sensor", "2001:db8:cafe:01:03::0001:0C0D", DeviceStatus::Offline)
            .unwrap();

        let last = store.list().last().unwrap();
        assert_eq!(last, &second);
        assert_eq!(last.name, "Roof Sensor");
        assert_eq!(last.device_type, "sensor");
        assert_eq!(last.address, "2001:db8:cafe:01:03::0001:0C0D");
        assert_eq!(last.status, DeviceStatus::Offline);
        assert!(!last.registered_at.is_empty());

        assert_eq!(first.status, DeviceStatus::Online);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_ids_are_distinct_for_rapid_adds() {
        let mut store = empty_store();
        for i in 0..50 {
            store.add(&format!("device-{}", i), "endpoint", "::1").unwrap();
        }
        let mut ids: Vec<i64> = store.list().iter().map(|d| d.id).collect();
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn test_ids_advance_past_future_stored_ids() {
        let future = Utc::now().timestamp_millis() + 1_000_000;
        let blob = format!(
            r#"[{{"id":{},"name":"a","type":"sensor","ipv6":"::1","status":"online","registered":""}}]"#,
            future
        );
        let backend = MemoryBlobStore::with_entry(DEFAULT_STORAGE_KEY, &blob);
        let mut store = InventoryStore::open(backend, DEFAULT_STORAGE_KEY).unwrap();
        let added = store.add("b", "camera", "::2").unwrap();
        assert_eq!(added.id, future + 1);
    }

    #[test]
    fn test_ids_stay_distinct_when_max_id_is_stored() {
        let blob = format!(
            r#"[{{"id":{},"name":"a","type":"sensor","ipv6":"::1","status":"online","registered":""}}]"#,
            i64::MAX
        );
        let backend = MemoryBlobStore::with_entry(DEFAULT_STORAGE_KEY, &blob);
        let mut store = InventoryStore::open(backend, DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(store.len(), 1);

        let first = store.add("b", "camera", "::2").unwrap();
        let second = store.add("c", "camera", "::3").unwrap();
        assert_ne!(first.id, i64::MAX);
        assert_ne!(second.id, i64::MAX);
        assert_ne!(first.id, second.id);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_unknown_status_keeps_whole_inventory() {
        let blob = r#"[{"id":1,"name":"a","type":"sensor","ipv6":"::1","status":"online","registered":""},{"id":2,"name":"b","type":"camera","ipv6":"::2","status":"maintenance","registered":""}]"#;
        let backend = MemoryBlobStore::with_entry(DEFAULT_STORAGE_KEY, blob);
        let mut store = InventoryStore::open(backend, DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.count_by_status(DeviceStatus::Online), 1);
        assert_eq!(store.count_by_status(DeviceStatus::Offline), 0);

        store.add("c", "gateway", "::3").unwrap();

        let reloaded = store.load().unwrap();
        let names: Vec<&str> = reloaded.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(
            reloaded[1].status,
            DeviceStatus::Other("maintenance".to_string())
        );
    }

    #[test]
    fn test_unknown_type_is_stored_verbatim() {
        let mut store = empty_store();
        let device = store.add("Kiosk", "Kiosk-Display", "::1").unwrap();
        assert_eq!(device.device_type, "Kiosk-Display");
    }

    #[test]
    fn test_counters() {
        let mut store = empty_store();
        store.add("a", "sensor", "::1").unwrap();
        store
            .add_with_status("b", "camera", "::2", DeviceStatus::Offline)
            .unwrap();
        store.add("c", "sensor", "::3").unwrap();

        assert_eq!(store.count_by_status(DeviceStatus::Online), 2);
        assert_eq!(store.count_by_status(DeviceStatus::Offline), 1);

        for t in ["sensor", "camera", "gateway", "Sensor", ""] {
            assert_eq!(
                store.count_by_type(t, false) + store.count_by_type(t, true),
                store.len(),
                "type {:?}",
                t
            );
        }
        assert_eq!(store.count_by_type("sensor", false), 2);
        assert_eq!(store.count_by_type("Sensor", false), 0);

        assert_eq!(
            store.stats(),
            InventoryStats {
                total: 3,
                online: 2,
                sensors: 2,
                non_sensors: 1,
            }
        );
    }

    #[test]
    fn test_filters() {
        let mut store = empty_store();
        store.add("a", "sensor", "::1").unwrap();
        store
            .add_with_status("b", "camera", "::2", DeviceStatus::Offline)
            .unwrap();
        store.add("c", "gateway", "::3").unwrap();

        let online: Vec<&str> = store
            .filter_by_status(DeviceStatus::Online)
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(online, vec!["a", "c"]);

        let gateways = store.filter(|d| d.device_type == "gateway");
        assert_eq!(gateways.len(), 1);
        assert_eq!(gateways[0].name, "c");
    }

    #[test]
    fn test_save_then_reopen_round_trips() {
        let mut store = empty_store();
        store.add("a", "sensor", "2001:db8:cafe:01:01::0001:0001").unwrap();
        store
            .add_with_status("b", "camera", "2001:db8:cafe:01:01::0002:0002", DeviceStatus::Offline)
            .unwrap();
        store.add("c", "unknown", "2001:db8:cafe:01:01::0005:0003").unwrap();
        let saved = store.list().to_vec();

        assert_eq!(store.load().unwrap(), saved);

        let reopened = InventoryStore::open(store.into_backend(), DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(reopened.list(), saved.as_slice());
    }

    #[test]
    fn test_seed_only_when_empty() {
        let mut store = empty_store();
        assert!(store.seed_if_empty().unwrap());
        assert_eq!(store.len(), 3);

        let names: Vec<&str> = store.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Main Gateway", "Temperature Sensor 1", "Security Camera A"]
        );
        assert_eq!(store.list()[0].address, "2001:db8:cafe:1:1::0003:0001");

        assert!(!store.seed_if_empty().unwrap());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_borrowed_backend_keeps_data() {
        let mut backend = MemoryBlobStore::new();
        {
            let mut store = InventoryStore::open(&mut backend, DEFAULT_STORAGE_KEY).unwrap();
            store.add("a", "sensor", "::1").unwrap();
        }
        let stored = backend.read(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        assert!(stored.contains("\"ipv6\":\"::1\""));
    }

    #[test]
    fn test_native_db_in_memory_round_trip() {
        let mut backend = NativeDbBlobStore::in_memory().unwrap();
        assert_eq!(backend.read("campusDevices").unwrap(), None);
        backend.write("campusDevices", "[]").unwrap();
        backend.write("campusDevices", "[1]").unwrap();
        assert_eq!(backend.read("campusDevices").unwrap().as_deref(), Some("[1]"));
    }
}
