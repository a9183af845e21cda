//! Address synthesis for campus devices.
//!
//! Every generated address has the layout
//! `2001:db8:cafe:<campus>:<subnet>::<type code>:<device id>` where campus and subnet are
//! at least two uppercase hex digits, and the type code and device id are four.

use rand::Rng;

use crate::models::DeviceType;

/// Fixed 48-bit routing prefix shared by every campus address.
pub const CAMPUS_PREFIX: &str = "2001:db8:cafe";

/// Value used for campus and subnet fields that are absent or not numeric.
pub const DEFAULT_FIELD_VALUE: u64 = 1;

/// Structured form of a synthesized address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampusAddress {
    pub campus: u64,
    pub subnet: u64,
    pub device_type: DeviceType,
    pub device_id: u16,
}

impl CampusAddress {
    pub fn new(campus: u64, subnet: u64, device_type: DeviceType, device_id: u16) -> Self {
        Self {
            campus,
            subnet,
            device_type,
            device_id,
        }
    }
}

impl std::fmt::Display for CampusAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{:02X}:{:02X}::{:04X}:{:04X}",
            CAMPUS_PREFIX,
            self.campus,
            self.subnet,
            self.device_type.code(),
            self.device_id
        )
    }
}

/// Parses a free-form campus or subnet field.
///
/// Takes the leading run of decimal digits after optional whitespace and an optional `+`,
/// ignoring whatever follows. Inputs with no digits, a leading `-`, or a value that does not
/// fit in a `u64` normalise to [`DEFAULT_FIELD_VALUE`]. Never fails.
pub fn parse_field(input: &str) -> u64 {
    let trimmed = input.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_len = unsigned
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();

    if digits_len == 0 {
        return DEFAULT_FIELD_VALUE;
    }

    unsigned[..digits_len]
        .parse::<u64>()
        .unwrap_or(DEFAULT_FIELD_VALUE)
}

/// Builds a [`CampusAddress`] drawing the device id from `rng`.
pub fn synthesize_with<R: Rng>(
    rng: &mut R,
    campus_id: &str,
    subnet_id: &str,
    device_type: &str,
) -> CampusAddress {
    CampusAddress::new(
        parse_field(campus_id),
        parse_field(subnet_id),
        DeviceType::from(device_type),
        rng.gen_range(0..u16::MAX),
    )
}

/// Generates an address for a device. Repeated calls with the same inputs differ in the
/// random device id.
pub fn synthesize(campus_id: &str, subnet_id: &str, device_type: &str) -> String {
    synthesize_with(&mut rand::thread_rng(), campus_id, subnet_id, device_type).to_string()
}
