use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use super::serde_helpers::deserialize_record_id;

// ===== ENUMS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Sensor,
    Camera,
    Gateway,
    Controller,
    Endpoint,
}

impl DeviceType {
    pub const ALL: [DeviceType; 5] = [
        DeviceType::Sensor,
        DeviceType::Camera,
        DeviceType::Gateway,
        DeviceType::Controller,
        DeviceType::Endpoint,
    ];

    /// 16-bit code embedded in synthesized addresses.
    pub fn code(&self) -> u16 {
        match self {
            DeviceType::Sensor => 0x0001,
            DeviceType::Camera => 0x0002,
            DeviceType::Gateway => 0x0003,
            DeviceType::Controller => 0x0004,
            DeviceType::Endpoint => 0x0005,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Sensor => "sensor",
            DeviceType::Camera => "camera",
            DeviceType::Gateway => "gateway",
            DeviceType::Controller => "controller",
            DeviceType::Endpoint => "endpoint",
        }
    }

    /// Case-insensitive lookup that only succeeds for the five recognised types.
    pub fn known(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sensor" => Some(DeviceType::Sensor),
            "camera" => Some(DeviceType::Camera),
            "gateway" => Some(DeviceType::Gateway),
            "controller" => Some(DeviceType::Controller),
            "endpoint" => Some(DeviceType::Endpoint),
            _ => None,
        }
    }
}

impl From<&str> for DeviceType {
    fn from(s: &str) -> Self {
        DeviceType::known(s).unwrap_or(DeviceType::Endpoint)
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reachability of a registered device.
///
/// Stored blobs may carry statuses other than `online`/`offline`; those are kept verbatim in
/// [`DeviceStatus::Other`] so one unfamiliar record never invalidates the whole inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceStatus {
    #[default]
    Online,
    Offline,
    Other(String),
}

impl DeviceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
            DeviceStatus::Other(status) => status,
        }
    }
}

impl From<String> for DeviceStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "online" => DeviceStatus::Online,
            "offline" => DeviceStatus::Offline,
            _ => DeviceStatus::Other(s),
        }
    }
}

impl From<DeviceStatus> for String {
    fn from(status: DeviceStatus) -> Self {
        match status {
            DeviceStatus::Other(status) => status,
            known => known.as_str().to_string(),
        }
    }
}

/// Strict parse for user input: only the two statuses the tooling assigns are accepted.
impl std::str::FromStr for DeviceStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(DeviceStatus::Online),
            "offline" => Ok(DeviceStatus::Offline),
            other => Err(anyhow::anyhow!("Unknown device status: {}", other)),
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

// ===== DATA STRUCTURES =====

/// One entry of the campus inventory.
///
/// Field names on the wire (`type`, `ipv6`, `registered`) match the blobs written by the
/// browser tool, so existing stored inventories keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(deserialize_with = "deserialize_record_id")]
    pub id: i64,
    pub name: String,
    /// Stored verbatim; only synthesis maps unknown values to `endpoint`.
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(rename = "ipv6")]
    pub address: String,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(rename = "registered", default)]
    pub registered_at: String,
}

impl DeviceRecord {
    pub fn new(
        id: i64,
        name: String,
        device_type: String,
        address: String,
        status: DeviceStatus,
        registered_at: String,
    ) -> Self {
        Self {
            id,
            name,
            device_type,
            address,
            status,
            registered_at,
        }
    }

    pub fn is_online(&self) -> bool {
        self.status == DeviceStatus::Online
    }
}

/// Renders a registration timestamp the way `Date.prototype.toLocaleString` does for en-US,
/// e.g. `10/16/2026, 3:04:05 PM`.
pub fn format_registered_at<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

pub fn registered_now() -> String {
    format_registered_at(&Local::now())
}

/// Aggregate counters shown above the inventory table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventoryStats {
    pub total: usize,
    pub online: usize,
    pub sensors: usize,
    pub non_sensors: usize,
}
