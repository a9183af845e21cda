use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::store::DEFAULT_STORAGE_KEY;

pub const DEFAULT_DB_PATH: &str = "campus_inventory.db";

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryConfig {
    pub db_path: PathBuf,
    pub storage_key: String,
    pub seed_on_empty: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            seed_on_empty: true,
        }
    }
}

impl InventoryConfig {
    /// Creates a config from environment variables, loading `.env` first if present
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates a config from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_path = lookup("CAMPUS_INVENTORY_DB")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let storage_key = lookup("CAMPUS_STORAGE_KEY")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.storage_key);

        let seed_on_empty = match lookup("CAMPUS_SEED_ON_EMPTY") {
            None => defaults.seed_on_empty,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                other => {
                    return Err(anyhow!(
                        "CAMPUS_SEED_ON_EMPTY must be true or false, got '{}'",
                        other
                    ))
                }
            },
        };

        Ok(InventoryConfig {
            db_path,
            storage_key,
            seed_on_empty,
        })
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }
}
