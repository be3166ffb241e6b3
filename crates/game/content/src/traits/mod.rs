//! Stock data-driven trait kinds.
//!
//! Each kind is a `*Info` parameter struct implementing
//! [`TraitInfo`](rts_core::TraitInfo) plus an instance type. With the
//! `serde` feature the infos deserialize from the `params` block of a
//! ruleset entry; [`TraitFactory::with_stock_traits`](crate::TraitFactory)
//! registers them under their kind names.
//!
//! Kinds that live in `rts-core` (`Health`, `Facing`) are registered too.
mod modifiers;
mod presentation;
mod reactions;
mod spatial;

pub use modifiers::{MultiplierInfo, MultiplierTrait};
pub use presentation::{
    CloakInfo, CloakTrait, DamagedPaletteInfo, DamagedPaletteTrait, HealthPipsInfo,
    HealthPipsTrait, RenderSpritesInfo, RenderSpritesTrait, StanceVisibilityInfo,
    StanceVisibilityTrait, TargetableInfo, TargetableTrait, TooltipInfo, TooltipTrait,
};
pub use reactions::{
    OrderRestrictionsInfo, OrderRestrictionsTrait, SelfHealingInfo, SelfHealingTrait,
    SpawnActorOnDeathInfo, SpawnActorOnDeathTrait, UpgradeOnDamageStateInfo,
    UpgradeOnDamageStateTrait,
};
pub use spatial::{BuildingInfo, BuildingTrait, MobileInfo, MobileTrait, MoveTo};

/// Initializer naming the cell an actor is created at.
pub const LOCATION_INIT: &str = "location";
