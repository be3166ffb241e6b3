//! Content loaders for reading rulesets and configuration from files.
//!
//! Actor catalogs are RON, configuration is TOML. Every loader returns
//! [`LoadResult`] with enough context to point a content author at the
//! offending actor, trait or file.

pub mod actors;
pub mod config;
pub mod factory;
pub mod traits;

pub use actors::RulesetLoader;
pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use traits::TraitFactory;

use std::path::Path;

use ron::extensions::Extensions;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

/// RON dialect shared by catalogs and trait params: optional fields may be
/// written without `Some(..)`.
pub(crate) fn ron_options() -> ron::Options {
    ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME)
}
