use rts_core::contract::{
    DamageModifier, FirepowerModifier, InaccuracyModifier, PowerModifier, RangeModifier,
    ReloadModifier, SpeedModifier,
};
use rts_core::{
    ActorInitializer, ActorTrait, ActorView, AssemblyError, Capability, Conditional,
    ConditionalInfo, ModifierAxis, TraitInfo, Upgradable, Warhead,
};

/// Percentage multiplier on one modifier axis, typically gated by an upgrade
/// (veterancy, crates, support powers).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct MultiplierInfo {
    pub axis: ModifierAxis,
    pub percent: i32,
    /// Damage axis only: restrict to warheads carrying one of these types.
    /// Empty matches every warhead.
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_types: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub conditional: ConditionalInfo,
}

impl MultiplierInfo {
    pub fn new(axis: ModifierAxis, percent: i32) -> Self {
        Self {
            axis,
            percent,
            damage_types: Vec::new(),
            conditional: ConditionalInfo::default(),
        }
    }

    #[must_use]
    pub fn requiring(mut self, upgrades: &[&str]) -> Self {
        self.conditional = ConditionalInfo::requiring(upgrades);
        self
    }
}

impl TraitInfo for MultiplierInfo {
    fn kind(&self) -> &'static str {
        "Multiplier"
    }

    fn provides(&self) -> &[Capability] {
        match self.axis {
            ModifierAxis::Speed => &[Capability::SpeedModifier, Capability::Upgradable],
            ModifierAxis::Firepower => &[Capability::FirepowerModifier, Capability::Upgradable],
            ModifierAxis::Damage => &[Capability::DamageModifier, Capability::Upgradable],
            ModifierAxis::Reload => &[Capability::ReloadModifier, Capability::Upgradable],
            ModifierAxis::Inaccuracy => &[Capability::InaccuracyModifier, Capability::Upgradable],
            ModifierAxis::Range => &[Capability::RangeModifier, Capability::Upgradable],
            ModifierAxis::Power => &[Capability::PowerModifier, Capability::Upgradable],
        }
    }

    fn create(&self, _: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(MultiplierTrait {
            axis: self.axis,
            percent: self.percent,
            damage_types: self.damage_types.clone(),
            conditional: Conditional::new(self.conditional.clone()),
        }))
    }
}

#[derive(Debug)]
pub struct MultiplierTrait {
    axis: ModifierAxis,
    percent: i32,
    damage_types: Vec<String>,
    conditional: Conditional,
}

impl MultiplierTrait {
    pub fn axis(&self) -> ModifierAxis {
        self.axis
    }

    fn on(&self, axis: ModifierAxis) -> bool {
        self.axis == axis
    }
}

impl SpeedModifier for MultiplierTrait {
    fn speed_modifier(&self) -> i32 {
        self.percent
    }
}

impl FirepowerModifier for MultiplierTrait {
    fn firepower_modifier(&self) -> i32 {
        self.percent
    }
}

impl DamageModifier for MultiplierTrait {
    fn damage_modifier(&self, _: Option<&ActorView<'_>>, warhead: Option<&Warhead>) -> i32 {
        if self.damage_types.is_empty() {
            return self.percent;
        }
        let matches = warhead.is_some_and(|w| self.damage_types.iter().any(|t| w.has_damage_type(t)));
        if matches { self.percent } else { 100 }
    }
}

impl ReloadModifier for MultiplierTrait {
    fn reload_modifier(&self) -> i32 {
        self.percent
    }
}

impl InaccuracyModifier for MultiplierTrait {
    fn inaccuracy_modifier(&self) -> i32 {
        self.percent
    }
}

impl RangeModifier for MultiplierTrait {
    fn range_modifier(&self) -> i32 {
        self.percent
    }
}

impl PowerModifier for MultiplierTrait {
    fn power_modifier(&self) -> i32 {
        self.percent
    }
}

impl Upgradable for MultiplierTrait {
    fn conditional(&self) -> &Conditional {
        &self.conditional
    }

    fn conditional_mut(&mut self) -> &mut Conditional {
        &mut self.conditional
    }
}

impl ActorTrait for MultiplierTrait {
    fn as_speed_modifier(&self) -> Option<&dyn SpeedModifier> {
        self.on(ModifierAxis::Speed).then_some(self as &dyn SpeedModifier)
    }

    fn as_firepower_modifier(&self) -> Option<&dyn FirepowerModifier> {
        self.on(ModifierAxis::Firepower)
            .then_some(self as &dyn FirepowerModifier)
    }

    fn as_damage_modifier(&self) -> Option<&dyn DamageModifier> {
        self.on(ModifierAxis::Damage).then_some(self as &dyn DamageModifier)
    }

    fn as_reload_modifier(&self) -> Option<&dyn ReloadModifier> {
        self.on(ModifierAxis::Reload).then_some(self as &dyn ReloadModifier)
    }

    fn as_inaccuracy_modifier(&self) -> Option<&dyn InaccuracyModifier> {
        self.on(ModifierAxis::Inaccuracy)
            .then_some(self as &dyn InaccuracyModifier)
    }

    fn as_range_modifier(&self) -> Option<&dyn RangeModifier> {
        self.on(ModifierAxis::Range).then_some(self as &dyn RangeModifier)
    }

    fn as_power_modifier(&self) -> Option<&dyn PowerModifier> {
        self.on(ModifierAxis::Power).then_some(self as &dyn PowerModifier)
    }

    fn as_upgradable(&self) -> Option<&dyn Upgradable> {
        Some(self)
    }

    fn as_upgradable_mut(&mut self) -> Option<&mut dyn Upgradable> {
        Some(self)
    }
}
