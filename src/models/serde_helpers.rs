// Serde helpers for persisted fields that may have been written by other tools.

use serde::{Deserialize, Deserializer};

/// Deserializes a record id from a JSON integer, a JSON float (JavaScript `Date.now()` numbers)
/// or a numeric string.
pub fn deserialize_record_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdFormat {
        Integer(i64),
        Float(f64),
        String(String),
    }

    match IdFormat::deserialize(deserializer)? {
        IdFormat::Integer(id) => Ok(id),
        IdFormat::Float(id) => {
            if id.is_finite() && id.fract() == 0.0 && id.abs() < i64::MAX as f64 {
                Ok(id as i64)
            } else {
                Err(serde::de::Error::custom(format!(
                    "record id {} is not an integer",
                    id
                )))
            }
        }
        IdFormat::String(s) => s.trim().parse::<i64>().map_err(serde::de::Error::custom),
    }
}
