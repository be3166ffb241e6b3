//! Simulation configuration loader.

use std::path::Path;

use rts_core::SimConfig;
use serde::de::DeserializeOwned;

use crate::loaders::{LoadResult, read_file};

/// Loader for configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a [`SimConfig`] from a TOML file. Missing keys keep their
    /// defaults.
    pub fn load(path: &Path) -> LoadResult<SimConfig> {
        Self::load_as(path)
    }

    /// Load any TOML-backed configuration type. Hosts use this for configs
    /// that embed a [`SimConfig`] table.
    pub fn load_as<T: DeserializeOwned>(path: &Path) -> LoadResult<T> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))
    }

    pub fn parse<T: DeserializeOwned>(content: &str) -> LoadResult<T> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))
    }
}
