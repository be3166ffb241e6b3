//! Trait kind registry used by the ruleset loader.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rts_core::{FacingInfo, HealthInfo, TraitInfo};
use serde::de::DeserializeOwned;

use crate::loaders::{LoadResult, ron_options};
use crate::traits::{
    BuildingInfo, CloakInfo, DamagedPaletteInfo, HealthPipsInfo, MobileInfo, MultiplierInfo,
    OrderRestrictionsInfo, RenderSpritesInfo, SelfHealingInfo, SpawnActorOnDeathInfo,
    StanceVisibilityInfo, TargetableInfo, TooltipInfo, UpgradeOnDamageStateInfo,
};

type Builder = Box<dyn Fn(&str) -> LoadResult<Arc<dyn TraitInfo>> + Send + Sync>;

/// Maps `kind` strings of a catalog to deserializers of the matching
/// [`TraitInfo`].
///
/// Content crates register their own kinds next to the stock ones:
///
/// ```rust,ignore
/// let mut factory = TraitFactory::with_stock_traits();
/// factory.register::<ArmamentInfo>("Armament");
/// ```
#[derive(Default)]
pub struct TraitFactory {
    builders: BTreeMap<String, Builder>,
}

impl TraitFactory {
    /// An empty factory without any kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with every stock kind of `rts-core` and this crate.
    pub fn with_stock_traits() -> Self {
        let mut factory = Self::new();
        factory.register::<HealthInfo>("Health");
        factory.register::<FacingInfo>("Facing");
        factory.register::<MultiplierInfo>("Multiplier");
        factory.register::<TooltipInfo>("Tooltip");
        factory.register::<TargetableInfo>("Targetable");
        factory.register::<RenderSpritesInfo>("RenderSprites");
        factory.register::<DamagedPaletteInfo>("DamagedPalette");
        factory.register::<HealthPipsInfo>("HealthPips");
        factory.register::<StanceVisibilityInfo>("StanceVisibility");
        factory.register::<CloakInfo>("Cloak");
        factory.register::<BuildingInfo>("Building");
        factory.register::<MobileInfo>("Mobile");
        factory.register::<SelfHealingInfo>("SelfHealing");
        factory.register::<UpgradeOnDamageStateInfo>("UpgradeOnDamageState");
        factory.register::<SpawnActorOnDeathInfo>("SpawnActorOnDeath");
        factory.register::<OrderRestrictionsInfo>("OrderRestrictions");
        factory
    }

    /// Registers `I` under `kind`, replacing any earlier registration.
    pub fn register<I>(&mut self, kind: &str)
    where
        I: TraitInfo + DeserializeOwned + 'static,
    {
        let name = kind.to_string();
        self.register_with(kind, move |params| {
            let info: I = ron_options()
                .from_str(params)
                .map_err(|e| anyhow::anyhow!("Invalid params for {}: {}", name, e))?;
            Ok(Arc::new(info) as Arc<dyn TraitInfo>)
        });
    }

    /// Registers a custom builder receiving the raw RON `params` text.
    pub fn register_with<F>(&mut self, kind: &str, builder: F)
    where
        F: Fn(&str) -> LoadResult<Arc<dyn TraitInfo>> + Send + Sync + 'static,
    {
        self.builders.insert(kind.to_string(), Box::new(builder));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.builders.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    /// Builds the info for `kind` from its `params` text.
    pub fn build(&self, kind: &str, params: &str) -> LoadResult<Arc<dyn TraitInfo>> {
        let builder = self
            .builders
            .get(kind)
            .ok_or_else(|| anyhow::anyhow!("Unknown trait kind `{}`", kind))?;
        builder(params)
    }
}

impl fmt::Debug for TraitFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraitFactory")
            .field("kinds", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rts_core::Capability;

    #[test]
    fn stock_kinds_match_their_infos() {
        let factory = TraitFactory::with_stock_traits();
        for kind in factory.kinds() {
            let info = factory.build(kind, "()");
            // Kinds with required params refuse an empty block; the others
            // must report the kind they were registered under.
            if let Ok(info) = info {
                assert_eq!(info.kind(), kind);
            }
        }
        assert!(factory.contains("Health"));
        assert!(!factory.contains("Armament"));
    }

    #[test]
    fn params_deserialize_into_the_info() {
        let factory = TraitFactory::with_stock_traits();
        let info = factory
            .build("Multiplier", "(axis: Firepower, percent: 125)")
            .unwrap();
        assert_eq!(info.kind(), "Multiplier");
        assert_eq!(
            info.provides(),
            &[Capability::FirepowerModifier, Capability::Upgradable]
        );

        let tooltip = factory
            .build("Tooltip", r#"(name: "Spy", generic_name: "Infantry")"#)
            .unwrap();
        assert_eq!(tooltip.provides(), &[Capability::Tooltip]);
    }

    #[test]
    fn bad_params_and_unknown_kinds_fail() {
        let factory = TraitFactory::with_stock_traits();
        let err = factory.build("Multiplier", "(axis: Sideways)").unwrap_err();
        assert!(err.to_string().contains("Multiplier"), "{err}");
        let err = factory.build("Armament", "()").unwrap_err();
        assert!(err.to_string().contains("Armament"), "{err}");
    }

    #[test]
    fn custom_builders_take_precedence() {
        let mut factory = TraitFactory::with_stock_traits();
        factory.register_with("Health", |_| Ok(Arc::new(HealthInfo::new(7)) as Arc<dyn TraitInfo>));
        let info = factory.build("Health", "(hp: 500)").unwrap();
        assert_eq!(format!("{info:?}"), format!("{:?}", HealthInfo::new(7)));
    }
}
