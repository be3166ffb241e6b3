//! Traits that react to notifications by emitting effects.
use rts_core::contract::{NotifyDamageStateChanged, NotifyKilled, Tickable};
use rts_core::{
    ActorInitializer, ActorTrait, AssemblyError, AttackInfo, Capability, Conditional,
    ConditionalInfo, DamageState, Effect, InitValues, Order, PlayerId, SyncHasher, SyncState,
    Target, TraitContext, TraitInfo, Upgradable, ValidateOrder, WorldView,
};

use super::LOCATION_INIT;

// ---------------------------------------------------------------------------
// SelfHealing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SelfHealingInfo {
    pub step: i32,
    /// Ticks between heals.
    pub delay: u32,
    /// Only heal while HP is below this percentage of max.
    pub heal_if_below: i32,
    pub conditional: ConditionalInfo,
}

impl Default for SelfHealingInfo {
    fn default() -> Self {
        Self {
            step: 5,
            delay: 5,
            heal_if_below: 50,
            conditional: ConditionalInfo::default(),
        }
    }
}

impl TraitInfo for SelfHealingInfo {
    fn kind(&self) -> &'static str {
        "SelfHealing"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::Tick, Capability::Upgradable, Capability::SyncState]
    }

    fn requires(&self) -> &[Capability] {
        &[Capability::Health]
    }

    fn create(&self, _: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(SelfHealingTrait {
            info: self.clone(),
            ticks: 0,
            conditional: Conditional::new(self.conditional.clone()),
        }))
    }
}

#[derive(Debug)]
pub struct SelfHealingTrait {
    info: SelfHealingInfo,
    ticks: u32,
    conditional: Conditional,
}

impl Tickable for SelfHealingTrait {
    fn tick(&mut self, ctx: &mut TraitContext<'_>) {
        if self.conditional.is_disabled() {
            return;
        }
        let Some(health) = ctx.this().and_then(|a| a.health()) else {
            return;
        };
        if health.is_dead() || health.hp() * 100 >= self.info.heal_if_below * health.max_hp() {
            self.ticks = 0;
            return;
        }
        self.ticks += 1;
        if self.ticks < self.info.delay.max(1) {
            return;
        }
        self.ticks = 0;
        let me = ctx.actor_id();
        ctx.emit(Effect::InflictDamage {
            target: Target::Actor(me),
            damage: -self.info.step,
            warhead: None,
            ignore_modifiers: true,
        });
    }
}

impl Upgradable for SelfHealingTrait {
    fn conditional(&self) -> &Conditional {
        &self.conditional
    }

    fn conditional_mut(&mut self) -> &mut Conditional {
        &mut self.conditional
    }

    fn upgrade_disabled(&mut self, _ctx: &mut TraitContext<'_>) {
        self.ticks = 0;
    }
}

impl SyncState for SelfHealingTrait {
    fn sync_state(&self, hasher: &mut SyncHasher) {
        hasher.write_u32(self.ticks);
    }
}

impl ActorTrait for SelfHealingTrait {
    fn as_tick_mut(&mut self) -> Option<&mut dyn Tickable> {
        Some(self)
    }

    fn as_upgradable(&self) -> Option<&dyn Upgradable> {
        Some(self)
    }

    fn as_upgradable_mut(&mut self) -> Option<&mut dyn Upgradable> {
        Some(self)
    }

    fn as_sync_state(&self) -> Option<&dyn SyncState> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// UpgradeOnDamageState
// ---------------------------------------------------------------------------

/// Grants `upgrade` to its own actor while at or past `damage_state`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct UpgradeOnDamageStateInfo {
    pub upgrade: String,
    #[cfg_attr(feature = "serde", serde(default = "default_damage_state"))]
    pub damage_state: DamageState,
}

#[cfg(feature = "serde")]
fn default_damage_state() -> DamageState {
    DamageState::Heavy
}

impl TraitInfo for UpgradeOnDamageStateInfo {
    fn kind(&self) -> &'static str {
        "UpgradeOnDamageState"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::NotifyDamageStateChanged]
    }

    fn requires(&self) -> &[Capability] {
        &[Capability::Health]
    }

    fn create(&self, _: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(UpgradeOnDamageStateTrait {
            info: self.clone(),
            granted: false,
        }))
    }
}

#[derive(Debug)]
pub struct UpgradeOnDamageStateTrait {
    info: UpgradeOnDamageStateInfo,
    granted: bool,
}

impl NotifyDamageStateChanged for UpgradeOnDamageStateTrait {
    fn damage_state_changed(&mut self, ctx: &mut TraitContext<'_>, attack: &AttackInfo) {
        let reached =
            attack.damage_state >= self.info.damage_state && attack.damage_state != DamageState::Dead;
        let me = ctx.actor_id();
        if reached && !self.granted {
            self.granted = true;
            ctx.grant_upgrade(me, &self.info.upgrade);
        } else if !reached && self.granted {
            self.granted = false;
            ctx.revoke_upgrade(me, &self.info.upgrade);
        }
    }
}

impl ActorTrait for UpgradeOnDamageStateTrait {
    fn as_notify_damage_state_changed_mut(&mut self) -> Option<&mut dyn NotifyDamageStateChanged> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// SpawnActorOnDeath
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct SpawnActorOnDeathInfo {
    pub actor: String,
    /// Spawn for the neutral player instead of the dead actor's owner.
    #[cfg_attr(feature = "serde", serde(default))]
    pub neutral_owner: bool,
}

impl TraitInfo for SpawnActorOnDeathInfo {
    fn kind(&self) -> &'static str {
        "SpawnActorOnDeath"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::NotifyKilled]
    }

    fn create(&self, _: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(SpawnActorOnDeathTrait {
            info: self.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct SpawnActorOnDeathTrait {
    info: SpawnActorOnDeathInfo,
}

impl NotifyKilled for SpawnActorOnDeathTrait {
    fn killed(&mut self, ctx: &mut TraitContext<'_>, _attack: &AttackInfo) {
        let mut init = InitValues::new();
        if let Some(cell) = ctx.this().and_then(|a| a.location()) {
            init.insert(LOCATION_INIT, cell);
        }
        let owner = if self.info.neutral_owner {
            PlayerId::NEUTRAL
        } else {
            ctx.owner()
        };
        ctx.spawn(&self.info.actor, owner, init);
    }
}

impl ActorTrait for SpawnActorOnDeathTrait {
    fn as_notify_killed_mut(&mut self) -> Option<&mut dyn NotifyKilled> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// OrderRestrictions
// ---------------------------------------------------------------------------

/// World-actor filter rejecting the listed order ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrderRestrictionsInfo {
    pub blocked: Vec<String>,
}

impl TraitInfo for OrderRestrictionsInfo {
    fn kind(&self) -> &'static str {
        "OrderRestrictions"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::ValidateOrder]
    }

    fn create(&self, _: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        Ok(Box::new(OrderRestrictionsTrait {
            blocked: self.blocked.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct OrderRestrictionsTrait {
    blocked: Vec<String>,
}

impl ValidateOrder for OrderRestrictionsTrait {
    fn order_validation(&self, _world: &WorldView<'_>, order: &Order) -> bool {
        !self.blocked.iter().any(|id| *id == order.order_id)
    }
}

impl ActorTrait for OrderRestrictionsTrait {
    fn as_validate_order(&self) -> Option<&dyn ValidateOrder> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::fixtures::{ALICE, at, world};
    use crate::traits::modifiers::MultiplierInfo;
    use crate::traits::spatial::{BuildingInfo, MobileInfo};
    use rts_core::{
        ActorId, ActorTemplate, CellPos, HealthInfo, ModifierAxis, OrderOutcome, World,
    };

    fn hp(world: &World, id: ActorId) -> i32 {
        world.view().actor(id).unwrap().health().unwrap().hp()
    }

    #[test]
    fn heals_below_threshold_every_delay_ticks() {
        let mut world = world(vec![
            ActorTemplate::new("medic")
                .with(HealthInfo::new(100))
                .with(SelfHealingInfo {
                    step: 10,
                    delay: 2,
                    heal_if_below: 50,
                    ..SelfHealingInfo::default()
                }),
        ]);
        let id = world.spawn("medic", ALICE, &Default::default()).unwrap();
        world.inflict_damage(id, Target::Invalid, 70, None, true);
        assert_eq!(hp(&world, id), 30);

        world.tick();
        assert_eq!(hp(&world, id), 30);
        world.tick();
        assert_eq!(hp(&world, id), 40);
        world.tick();
        world.tick();
        assert_eq!(hp(&world, id), 50);
        world.tick();
        world.tick();
        assert_eq!(hp(&world, id), 50);
    }

    #[test]
    fn self_healing_requires_health() {
        let template = ActorTemplate::new("ghost").with(SelfHealingInfo::default());
        assert!(matches!(
            template.validate(),
            Err(AssemblyError::DependencyUnsatisfied {
                capability: Capability::Health,
                ..
            })
        ));
    }

    #[test]
    fn heavy_damage_grants_and_recovery_revokes() {
        let mut world = world(vec![
            ActorTemplate::new("tank")
                .with(HealthInfo::new(100))
                .with(UpgradeOnDamageStateInfo {
                    upgrade: "panic".into(),
                    damage_state: DamageState::Heavy,
                })
                .with(MultiplierInfo::new(ModifierAxis::Speed, 150).requiring(&["panic"])),
        ]);
        let id = world.spawn("tank", ALICE, &Default::default()).unwrap();
        let speed = |world: &World| {
            world
                .view()
                .actor(id)
                .unwrap()
                .apply_modifiers(ModifierAxis::Speed, 100)
        };
        assert_eq!(speed(&world), 100);

        world.inflict_damage(id, Target::Invalid, 60, None, true);
        assert_eq!(speed(&world), 150);

        world.inflict_damage(id, Target::Invalid, -50, None, true);
        assert_eq!(speed(&world), 100);
    }

    #[test]
    fn wreck_spawns_where_the_actor_died() {
        let mut world = world(vec![
            ActorTemplate::new("truck")
                .with(HealthInfo::new(50))
                .with(MobileInfo::default())
                .with(SpawnActorOnDeathInfo {
                    actor: "husk".into(),
                    neutral_owner: true,
                }),
            ActorTemplate::new("husk").with(BuildingInfo::default()),
        ]);
        let truck = world.spawn("truck", ALICE, &at(3, 2)).unwrap();
        world.kill(truck, Target::Invalid);

        assert!(world.actor(truck).is_none());
        let husk = world.occupancy().at(CellPos::new(3, 2))[0];
        let husk = world.actor(husk).unwrap();
        assert_eq!(husk.template().name(), "husk");
        assert_eq!(husk.owner(), PlayerId::NEUTRAL);
    }

    #[test]
    fn world_actor_filters_orders() {
        let mut world = world(vec![
            ActorTemplate::new("world").with(OrderRestrictionsInfo {
                blocked: vec!["Move".into()],
            }),
            ActorTemplate::new("rifle").with(MobileInfo::default()),
        ]);
        let rifle = world.spawn("rifle", ALICE, &at(0, 0)).unwrap();
        let order = Order::new("Move", rifle, Target::cell(CellPos::new(1, 0)), false);
        assert!(!world.validate_order(&order));
        assert_eq!(world.dispatch_order(&order), OrderOutcome::Rejected);

        let stop = Order::new("Stop", rifle, Target::Invalid, false);
        assert_eq!(world.dispatch_order(&stop), OrderOutcome::Handled);
    }
}
