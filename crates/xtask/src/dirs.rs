//! Platform-specific directory utilities
//!
//! Provides consistent directory paths across different operating systems,
//! following platform conventions for data directories.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding [`replay_dir`].
pub const REPLAY_DIR_ENV: &str = "RTS_REPLAY_DIR";

/// Get the directory recorded replays are kept in
///
/// `$RTS_REPLAY_DIR` wins; otherwise platform conventions apply:
/// - macOS: `~/Library/Application Support/rts/replays`
/// - Linux: `~/.local/share/rts/replays` (or `$XDG_DATA_HOME/rts/replays`)
/// - Windows: `%APPDATA%\rts\replays`
/// - Fallback: `./replays`
pub fn replay_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(REPLAY_DIR_ENV) {
        return PathBuf::from(dir);
    }
    directories::ProjectDirs::from("", "", "rts")
        .map(|dirs| dirs.data_dir().join("replays"))
        .unwrap_or_else(|| PathBuf::from("./replays"))
}

/// Find the most recently modified file in `dir`
pub fn find_latest_file(dir: &Path) -> Result<PathBuf> {
    let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if latest.as_ref().is_none_or(|(newest, _)| modified > *newest) {
            latest = Some((modified, path));
        }
    }

    latest
        .map(|(_, path)| path)
        .with_context(|| format!("No files found in {}", dir.display()))
}
