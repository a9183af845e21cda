use native_db::{native_db, ToKey};
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// A single persisted key-value entry. The inventory is stored as one of these,
/// its value holding the JSON-serialized device sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredBlob {
    #[primary_key]
    pub key: String,
    pub value: String,
}

impl StoredBlob {
    pub fn new(key: String, value: String) -> Self {
        Self { key, value }
    }
}
