use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use courier_media::MediaConfig;
use courier_store::StoreConfig;
use serde::Deserialize;

/// Top-level courier configuration, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct CourierConfig {
    #[serde(default)]
    pub storage: StoreConfig,

    #[serde(default)]
    pub media: MediaConfig,
}

impl CourierConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }
}
