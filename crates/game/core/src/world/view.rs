//! Read-only windows onto the world for trait callbacks and projections.
use std::collections::{BTreeMap, BTreeSet};

use crate::capability::Capability;
use crate::contract::OccupySpace;
use crate::facing::Facing;
use crate::health::{Health, Warhead};
use crate::lifecycle::Lifecycle;
use crate::modifier::{ModifierAxis, apply_percentage_modifiers};
use crate::player::{Players, Stance};
use crate::store::TraitStore;
use crate::types::{ActorId, CellPos, PlayerId, Tick, WorldPos};
use crate::world::actor::Actor;
use crate::world::occupancy::Occupancy;

#[derive(Clone, Copy)]
pub struct WorldView<'w> {
    pub(crate) actors: &'w BTreeMap<ActorId, Actor>,
    pub(crate) players: &'w Players,
    pub(crate) occupancy: &'w Occupancy,
    pub(crate) tick: Tick,
    pub(crate) world_actor: ActorId,
}

impl<'w> WorldView<'w> {
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn players(&self) -> &'w Players {
        self.players
    }

    pub fn stance(&self, from: PlayerId, to: PlayerId) -> Stance {
        self.players.stance(from, to)
    }

    /// Any live actor, in or out of the world.
    pub fn actor(&self, id: ActorId) -> Option<ActorView<'w>> {
        self.actors.get(&id).map(|actor| ActorView { actor, world: *self })
    }

    pub fn world_actor(&self) -> Option<ActorView<'w>> {
        self.actor(self.world_actor)
    }

    /// In-world actors in id order.
    pub fn actors(&self) -> impl Iterator<Item = ActorView<'w>> + 'w {
        let world = *self;
        self.actors
            .values()
            .filter(|actor| actor.lifecycle == Lifecycle::InWorld)
            .map(move |actor| ActorView { actor, world })
    }

    pub fn actors_at(&self, cell: CellPos) -> &'w [ActorId] {
        self.occupancy.at(cell)
    }
}

#[derive(Clone, Copy)]
pub struct ActorView<'w> {
    actor: &'w Actor,
    world: WorldView<'w>,
}

impl<'w> ActorView<'w> {
    pub fn id(&self) -> ActorId {
        self.actor.id
    }

    pub fn owner(&self) -> PlayerId {
        self.actor.owner
    }

    pub fn actor_type(&self) -> &'w str {
        self.actor.template.name()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.actor.lifecycle
    }

    pub fn is_in_world(&self) -> bool {
        self.actor.lifecycle == Lifecycle::InWorld && !self.actor.disposing
    }

    pub fn is_idle(&self) -> bool {
        self.actor.is_idle()
    }

    pub fn activity_names(&self) -> Vec<&'w str> {
        self.actor.activity_names()
    }

    pub fn traits(&self) -> &'w TraitStore {
        &self.actor.store
    }

    pub fn world(&self) -> WorldView<'w> {
        self.world
    }

    pub fn health(&self) -> Option<&'w dyn Health> {
        self.traits().unique(Capability::Health, |t| t.as_health())
    }

    /// Actors without a health provider never die.
    pub fn is_dead(&self) -> bool {
        self.health().is_some_and(|h| h.is_dead())
    }

    pub fn facing(&self) -> Option<&'w dyn Facing> {
        self.traits().unique(Capability::Facing, |t| t.as_facing())
    }

    pub fn occupy_space(&self) -> Option<&'w dyn OccupySpace> {
        self.traits()
            .unique(Capability::OccupySpace, |t| t.as_occupy_space())
    }

    pub fn center_position(&self) -> Option<WorldPos> {
        self.occupy_space().map(|o| o.center_position())
    }

    pub fn location(&self) -> Option<CellPos> {
        self.occupy_space().map(|o| o.top_left())
    }

    /// Owner as presented to other players.
    pub fn effective_owner(&self) -> PlayerId {
        self.traits()
            .unique(Capability::EffectiveOwner, |t| t.as_effective_owner())
            .filter(|e| e.disguised())
            .map_or(self.owner(), |e| e.effective_owner())
    }

    /// Stance of this actor's owner toward `player`.
    pub fn stance_toward(&self, player: PlayerId) -> Stance {
        self.world.stance(self.owner(), player)
    }

    /// Percentages from enabled providers of `axis`. Damage modifiers are
    /// asked without attacker context; see
    /// [`damage_modifiers`](Self::damage_modifiers).
    pub fn modifiers(&self, axis: ModifierAxis) -> Vec<i32> {
        let store = self.traits();
        let cap = axis.capability();
        match axis {
            ModifierAxis::Speed => store
                .query_enabled(cap, |t| t.as_speed_modifier())
                .map(|(_, m)| m.speed_modifier())
                .collect(),
            ModifierAxis::Firepower => store
                .query_enabled(cap, |t| t.as_firepower_modifier())
                .map(|(_, m)| m.firepower_modifier())
                .collect(),
            ModifierAxis::Reload => store
                .query_enabled(cap, |t| t.as_reload_modifier())
                .map(|(_, m)| m.reload_modifier())
                .collect(),
            ModifierAxis::Inaccuracy => store
                .query_enabled(cap, |t| t.as_inaccuracy_modifier())
                .map(|(_, m)| m.inaccuracy_modifier())
                .collect(),
            ModifierAxis::Range => store
                .query_enabled(cap, |t| t.as_range_modifier())
                .map(|(_, m)| m.range_modifier())
                .collect(),
            ModifierAxis::Power => store
                .query_enabled(cap, |t| t.as_power_modifier())
                .map(|(_, m)| m.power_modifier())
                .collect(),
            ModifierAxis::Damage => self.damage_modifiers(None, None),
        }
    }

    pub fn damage_modifiers(
        &self,
        attacker: Option<&ActorView<'_>>,
        warhead: Option<&Warhead>,
    ) -> Vec<i32> {
        self.traits()
            .query_enabled(Capability::DamageModifier, |t| t.as_damage_modifier())
            .map(|(_, m)| m.damage_modifier(attacker, warhead))
            .collect()
    }

    /// `base` scaled by every enabled provider of `axis`.
    pub fn apply_modifiers(&self, axis: ModifierAxis, base: i32) -> i32 {
        apply_percentage_modifiers(base, self.modifiers(axis))
    }

    /// Union of target types over enabled targetable traits.
    pub fn target_types(&self) -> BTreeSet<&'w str> {
        self.traits()
            .query_enabled(Capability::Targetable, |t| t.as_targetable())
            .flat_map(|(_, t)| t.target_types().iter().map(String::as_str))
            .collect()
    }

    pub fn is_targetable_by(&self, viewer: &ActorView<'_>) -> bool {
        self.traits()
            .query_enabled(Capability::Targetable, |t| t.as_targetable())
            .any(|(_, t)| t.targetable_by(self, viewer))
    }
}
