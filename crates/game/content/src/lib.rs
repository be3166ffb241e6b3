//! Stock traits and data-driven content loading.
//!
//! This crate provides the trait implementations most actors are built from
//! and the loaders that turn RON/TOML data files into a validated ruleset:
//! - Stat modifiers (speed, firepower, damage, ...), upgrade-gated
//! - Presentation (tooltips, sprites, palettes, pips, visibility)
//! - Spatial traits (buildings, mobile units and their move activity)
//! - Reactions (self healing, damage-state upgrades, death spawns, order filters)
//! - Actor catalogs with inheritance (RON)
//! - Simulation configuration (TOML)
//!
//! Every loader goes through a [`TraitFactory`], so content crates can add
//! their own trait kinds next to the stock ones.

pub mod traits;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use traits::{
    BuildingInfo, CloakInfo, DamagedPaletteInfo, HealthPipsInfo, LOCATION_INIT, MobileInfo,
    MoveTo, MultiplierInfo, OrderRestrictionsInfo, RenderSpritesInfo, SelfHealingInfo,
    SpawnActorOnDeathInfo, StanceVisibilityInfo, TargetableInfo, TooltipInfo,
    UpgradeOnDamageStateInfo,
};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, LoadResult, RulesetLoader, TraitFactory};
