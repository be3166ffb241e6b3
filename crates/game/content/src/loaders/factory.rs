//! Content factory for loading a mod directory.

use std::path::{Path, PathBuf};

use rts_core::{Ruleset, SimConfig};
use tracing::{debug, info};

use crate::loaders::{ConfigLoader, LoadResult, RulesetLoader, TraitFactory};

/// Content factory that loads all simulation content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// └── rules/
///     ├── infantry.ron
///     ├── structures.ron
///     └── world.ron
/// ```
///
/// Every `*.ron` file under `rules/` contributes to one ruleset.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load simulation configuration from `config.toml`, or the defaults if
    /// the file does not exist.
    pub fn load_config(&self) -> LoadResult<SimConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            debug!(target: "rts_content::loaders", path = %path.display(), "no config, using defaults");
            return Ok(SimConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Catalog files under `rules/`, sorted by file name.
    pub fn rule_files(&self) -> LoadResult<Vec<PathBuf>> {
        let rules_dir = self.data_dir.join("rules");
        let entries = std::fs::read_dir(&rules_dir).map_err(|e| {
            anyhow::anyhow!("Failed to read rules directory {}: {}", rules_dir.display(), e)
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| anyhow::anyhow!("Failed to read rules entry: {}", e))?
                .path();
            if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Load the ruleset from every catalog under `rules/`.
    pub fn load_ruleset(&self, factory: &TraitFactory) -> LoadResult<Ruleset> {
        let files = self.rule_files()?;
        if files.is_empty() {
            anyhow::bail!("No actor catalogs in {}", self.data_dir.join("rules").display());
        }
        let ruleset = RulesetLoader::load_all(&files, factory)?;
        info!(
            target: "rts_content::loaders",
            files = files.len(),
            actors = ruleset.len(),
            "content loaded"
        );
        Ok(ruleset)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
