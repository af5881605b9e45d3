//! Data registry: versioning and source tracking for each dataset.
//! Written by the normalizer; read by the app to show "data as of".

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSetEntry {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub path: String,
}

pub type Registry = HashMap<String, DataSetEntry>;

pub const DEFAULT_REGISTRY_PATH: &str = "data/registry.json";

/// Load the registry; a missing or unreadable file is an empty registry.
pub fn load_registry(path: impl AsRef<Path>) -> Registry {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Registry::new(),
    };
    serde_json::from_str(&raw).unwrap_or_default()
}

/// Write the registry back, creating parent directories as needed.
pub fn save_registry(path: impl AsRef<Path>, registry: &Registry) -> Result<(), std::io::Error> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = serde_json::to_string_pretty(registry).map_err(std::io::Error::other)?;
    fs::write(path, serialized)
}
