//! Hit points, damage states and the stock health trait.
use std::collections::BTreeSet;

use crate::capability::{ActorTrait, Capability};
use crate::error::AssemblyError;
use crate::store::{ActorInitializer, TraitInfo};
use crate::sync::{SyncHasher, SyncState};
use crate::target::Target;

/// Coarse health bucket derived from HP and thresholds.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageState {
    Undamaged,
    Light,
    Medium,
    Heavy,
    Critical,
    Dead,
}

/// Percentages of max HP at or below which a state begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DamageThresholds {
    pub medium: u8,
    pub heavy: u8,
    pub critical: u8,
}

impl DamageThresholds {
    pub const DEFAULT_MEDIUM: u8 = 75;
    pub const DEFAULT_HEAVY: u8 = 50;
    pub const DEFAULT_CRITICAL: u8 = 25;

    /// `Undamaged` only at full HP, `Dead` only at zero.
    pub fn state_for(&self, hp: i32, max_hp: i32) -> DamageState {
        if hp <= 0 {
            return DamageState::Dead;
        }
        if hp >= max_hp {
            return DamageState::Undamaged;
        }
        let scaled = hp as i64 * 100;
        let at_or_below = |percent: u8| scaled <= percent as i64 * max_hp as i64;
        if at_or_below(self.critical) {
            DamageState::Critical
        } else if at_or_below(self.heavy) {
            DamageState::Heavy
        } else if at_or_below(self.medium) {
            DamageState::Medium
        } else {
            DamageState::Light
        }
    }
}

impl Default for DamageThresholds {
    fn default() -> Self {
        Self {
            medium: Self::DEFAULT_MEDIUM,
            heavy: Self::DEFAULT_HEAVY,
            critical: Self::DEFAULT_CRITICAL,
        }
    }
}

/// Weapon impact description handed to damage modifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Warhead {
    pub name: String,
    pub damage_types: BTreeSet<String>,
    pub delay: u32,
}

impl Warhead {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_damage_type(mut self, damage_type: &str) -> Self {
        self.damage_types.insert(damage_type.to_string());
        self
    }

    pub fn has_damage_type(&self, damage_type: &str) -> bool {
        self.damage_types.contains(damage_type)
    }
}

/// Payload of every damage notification.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackInfo {
    /// HP actually removed (negative for healing).
    pub damage: i32,
    pub attacker: Target,
    pub warhead: Option<Warhead>,
    pub damage_state: DamageState,
    pub previous_damage_state: DamageState,
}

/// Result of applying damage to a health provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthChange {
    pub applied: i32,
    pub previous: DamageState,
    pub current: DamageState,
}

/// Unique health contract.
pub trait Health {
    fn hp(&self) -> i32;
    fn max_hp(&self) -> i32;

    fn display_hp(&self) -> i32 {
        self.hp()
    }

    fn damage_state(&self) -> DamageState;

    fn is_dead(&self) -> bool {
        self.damage_state() == DamageState::Dead
    }

    /// Whether the world destroys the actor once it is killed.
    fn remove_on_death(&self) -> bool {
        true
    }

    /// Applies `damage` (negative heals). Returns `None` when the actor is
    /// already dead.
    fn apply_damage(&mut self, damage: i32) -> Option<HealthChange>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HealthInfo {
    pub hp: i32,
    pub thresholds: DamageThresholds,
    pub remove_on_death: bool,
}

impl HealthInfo {
    pub const DEFAULT_HP: i32 = 100;
    /// Initializer holding the starting HP as a percentage of max.
    pub const INIT_KEY: &'static str = "health";

    pub fn new(hp: i32) -> Self {
        Self {
            hp,
            ..Self::default()
        }
    }
}

impl Default for HealthInfo {
    fn default() -> Self {
        Self {
            hp: Self::DEFAULT_HP,
            thresholds: DamageThresholds::default(),
            remove_on_death: true,
        }
    }
}

impl TraitInfo for HealthInfo {
    fn kind(&self) -> &'static str {
        "Health"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::Health, Capability::SyncState]
    }

    fn uses_inits(&self) -> &[&'static str] {
        &[Self::INIT_KEY]
    }

    fn create(&self, init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        let max_hp = self.hp.max(1);
        let percent = init.get_or(Self::INIT_KEY, 100i32)?.clamp(0, 100);
        let mut hp = (max_hp as i64 * percent as i64 / 100) as i32;
        if percent > 0 {
            hp = hp.max(1);
        }
        Ok(Box::new(HealthTrait {
            info: self.clone(),
            max_hp,
            hp,
        }))
    }
}

#[derive(Debug)]
pub struct HealthTrait {
    info: HealthInfo,
    max_hp: i32,
    hp: i32,
}

impl Health for HealthTrait {
    fn hp(&self) -> i32 {
        self.hp
    }

    fn max_hp(&self) -> i32 {
        self.max_hp
    }

    fn damage_state(&self) -> DamageState {
        self.info.thresholds.state_for(self.hp, self.max_hp)
    }

    fn remove_on_death(&self) -> bool {
        self.info.remove_on_death
    }

    fn apply_damage(&mut self, damage: i32) -> Option<HealthChange> {
        if self.hp <= 0 {
            return None;
        }
        let previous = self.damage_state();
        let next = (self.hp as i64 - damage as i64).clamp(0, self.max_hp as i64) as i32;
        let applied = self.hp - next;
        self.hp = next;
        Some(HealthChange {
            applied,
            previous,
            current: self.damage_state(),
        })
    }
}

impl SyncState for HealthTrait {
    fn sync_state(&self, hasher: &mut SyncHasher) {
        hasher.write_i32(self.hp);
    }
}

impl ActorTrait for HealthTrait {
    fn as_health(&self) -> Option<&dyn Health> {
        Some(self)
    }

    fn as_health_mut(&mut self) -> Option<&mut dyn Health> {
        Some(self)
    }

    fn as_sync_state(&self) -> Option<&dyn SyncState> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> DamageThresholds {
        DamageThresholds::default()
    }

    #[test]
    fn forty_percent_is_heavy() {
        assert_eq!(thresholds().state_for(40, 100), DamageState::Heavy);
    }

    #[test]
    fn boundaries() {
        let t = thresholds();
        assert_eq!(t.state_for(100, 100), DamageState::Undamaged);
        assert_eq!(t.state_for(99, 100), DamageState::Light);
        assert_eq!(t.state_for(75, 100), DamageState::Medium);
        assert_eq!(t.state_for(50, 100), DamageState::Heavy);
        assert_eq!(t.state_for(25, 100), DamageState::Critical);
        assert_eq!(t.state_for(1, 100), DamageState::Critical);
        assert_eq!(t.state_for(0, 100), DamageState::Dead);
    }

    #[test]
    fn damage_clamps_and_dead_stays_dead() {
        let mut health = HealthTrait {
            info: HealthInfo::default(),
            max_hp: 100,
            hp: 100,
        };
        let change = health.apply_damage(60).unwrap();
        assert_eq!(change.applied, 60);
        assert_eq!(change.previous, DamageState::Undamaged);
        assert_eq!(change.current, DamageState::Heavy);

        let change = health.apply_damage(500).unwrap();
        assert_eq!(change.applied, 40);
        assert!(health.is_dead());
        assert_eq!(health.hp(), 0);

        assert!(health.apply_damage(-50).is_none());
    }

    #[test]
    fn healing_caps_at_max() {
        let mut health = HealthTrait {
            info: HealthInfo::default(),
            max_hp: 100,
            hp: 30,
        };
        let change = health.apply_damage(-500).unwrap();
        assert_eq!(change.applied, -70);
        assert_eq!(change.current, DamageState::Undamaged);
    }
}
