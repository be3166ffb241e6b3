//! Upgrade-level driven enablement.
//!
//! An upgradable trait keeps a level counter. It is enabled while the level
//! lies in `min_enabled_level..=max_enabled_level`; crossing into or out of
//! that window fires exactly one hook. Disabled traits stay registered and
//! discoverable; aggregation and the trait's own callbacks consult the flag.
use crate::world::TraitContext;

/// Static upgrade configuration shared by all instances of a trait.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConditionalInfo {
    /// Upgrade types this trait listens to.
    pub upgrade_types: Vec<String>,
    pub min_enabled_level: u32,
    pub max_enabled_level: u32,
    /// Grants beyond this level are refused.
    pub max_accepted_level: u32,
}

impl ConditionalInfo {
    pub const DEFAULT_MIN_ENABLED_LEVEL: u32 = 0;
    pub const DEFAULT_MAX_ENABLED_LEVEL: u32 = u32::MAX;
    pub const DEFAULT_MAX_ACCEPTED_LEVEL: u32 = 1;

    /// Enabled only while at least one of `upgrade_types` is granted.
    pub fn requiring(upgrade_types: &[&str]) -> Self {
        Self {
            upgrade_types: upgrade_types.iter().map(|s| s.to_string()).collect(),
            min_enabled_level: 1,
            ..Self::default()
        }
    }

    pub fn is_enabled_at(&self, level: u32) -> bool {
        self.min_enabled_level <= level && level <= self.max_enabled_level
    }
}

impl Default for ConditionalInfo {
    fn default() -> Self {
        Self {
            upgrade_types: Vec::new(),
            min_enabled_level: Self::DEFAULT_MIN_ENABLED_LEVEL,
            max_enabled_level: Self::DEFAULT_MAX_ENABLED_LEVEL,
            max_accepted_level: Self::DEFAULT_MAX_ACCEPTED_LEVEL,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnablementChange {
    Enabled,
    Disabled,
}

/// Instance side of the upgrade state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conditional {
    info: ConditionalInfo,
    level: u32,
}

impl Conditional {
    pub fn new(info: ConditionalInfo) -> Self {
        Self { info, level: 0 }
    }

    pub fn info(&self) -> &ConditionalInfo {
        &self.info
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_enabled(&self) -> bool {
        self.info.is_enabled_at(self.level)
    }

    pub fn is_disabled(&self) -> bool {
        !self.is_enabled()
    }

    pub fn listens_to(&self, upgrade: &str) -> bool {
        self.info.upgrade_types.iter().any(|t| t == upgrade)
    }

    pub fn accepts_grant(&self, upgrade: &str) -> bool {
        self.listens_to(upgrade) && self.level < self.info.max_accepted_level
    }

    /// Moves to `level`, reporting a crossing of the enabled window.
    pub fn set_level(&mut self, level: u32) -> Option<EnablementChange> {
        let was_enabled = self.is_enabled();
        self.level = level;
        match (was_enabled, self.is_enabled()) {
            (false, true) => Some(EnablementChange::Enabled),
            (true, false) => Some(EnablementChange::Disabled),
            _ => None,
        }
    }
}

/// Traits whose enablement follows upgrade levels.
pub trait Upgradable {
    fn conditional(&self) -> &Conditional;
    fn conditional_mut(&mut self) -> &mut Conditional;

    fn upgrade_enabled(&mut self, _ctx: &mut TraitContext<'_>) {}
    fn upgrade_disabled(&mut self, _ctx: &mut TraitContext<'_>) {}

    fn is_trait_enabled(&self) -> bool {
        self.conditional().is_enabled()
    }
}
