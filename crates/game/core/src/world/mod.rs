//! The simulation world.
//!
//! [`World`] owns every actor and is the only thing that moves actors through
//! their lifecycle. Trait callbacks run one at a time: the running trait is
//! detached from its slot, handed a [`TraitContext`] with a read-only
//! [`WorldView`], and put back before the [`Effect`]s it emitted are applied.
//! Effects may dispatch further callbacks, so notification fan-out is
//! depth-first and bounded by [`SimConfig::max_dispatch_depth`].
mod actor;
mod context;
mod effects;
mod notify;
mod occupancy;
mod orders;
mod projection;
mod view;

pub use actor::Actor;
pub use context::{Effect, TraitContext};
pub use occupancy::Occupancy;
pub use orders::OrderOutcome;
pub use view::{ActorView, WorldView};

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, trace, warn};

use crate::activity::{Activity, ActivityState};
use crate::capability::{ActorTrait, Capability};
use crate::config::SimConfig;
use crate::error::WorldError;
use crate::lifecycle::Lifecycle;
use crate::player::Players;
use crate::rng::SimRng;
use crate::store::{ActorTemplate, InitValues, Ruleset, TraitIndex, TraitStore};
use crate::sync::{SyncHash, SyncHasher};
use crate::types::{ActorId, CellPos, PlayerId, Tick};

pub struct World {
    config: SimConfig,
    ruleset: Arc<Ruleset>,
    tick: Tick,
    rng: SimRng,
    players: Players,
    actors: BTreeMap<ActorId, Actor>,
    occupancy: Occupancy,
    next_actor_id: u32,
    world_actor: ActorId,
    dispatch_depth: usize,
}

impl World {
    /// Creates a world and its world actor from the ruleset's
    /// [`SimConfig::world_actor_type`] template (an empty template when the
    /// ruleset has none).
    pub fn new(
        ruleset: Arc<Ruleset>,
        players: Players,
        config: SimConfig,
        seed: u64,
    ) -> Result<Self, WorldError> {
        let template = if ruleset.contains(&config.world_actor_type) {
            Arc::clone(ruleset.get(&config.world_actor_type)?)
        } else {
            Arc::new(ActorTemplate::new(&config.world_actor_type))
        };

        let mut world = Self {
            config,
            ruleset,
            tick: Tick::ZERO,
            rng: SimRng::new(seed),
            players,
            actors: BTreeMap::new(),
            occupancy: Occupancy::default(),
            next_actor_id: 0,
            world_actor: ActorId(0),
            dispatch_depth: 0,
        };

        let id = world.create_from_template(template, PlayerId::NEUTRAL, &InitValues::new())?;
        world.world_actor = id;
        world.add_to_world(id)?;
        debug!(
            target: "rts_core::world",
            seed,
            players = world.players.len(),
            actor_types = world.ruleset.len(),
            "world created"
        );
        Ok(world)
    }

    pub fn view(&self) -> WorldView<'_> {
        WorldView {
            actors: &self.actors,
            players: &self.players,
            occupancy: &self.occupancy,
            tick: self.tick,
            world_actor: self.world_actor,
        }
    }

    /// Read-only view plus the RNG, borrowed disjointly for a callback.
    fn split(&mut self) -> (WorldView<'_>, &mut SimRng) {
        let view = WorldView {
            actors: &self.actors,
            players: &self.players,
            occupancy: &self.occupancy,
            tick: self.tick,
            world_actor: self.world_actor,
        };
        (view, &mut self.rng)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Concrete trait `T` on actor `id`, for hosts and tests poking at state.
    pub fn trait_of<T: ActorTrait>(&self, id: ActorId) -> Option<&T> {
        self.actors.get(&id)?.store.trait_of::<T>()
    }

    pub fn trait_of_mut<T: ActorTrait>(&mut self, id: ActorId) -> Option<&mut T> {
        self.actors.get_mut(&id)?.store.trait_of_mut::<T>()
    }

    /// Live actor ids in ascending order.
    pub fn actor_ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.keys().copied()
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn players(&self) -> &Players {
        &self.players
    }

    pub fn add_player(&mut self, name: &str, internal_name: &str) -> Result<PlayerId, WorldError> {
        self.players.add(name, internal_name)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn ruleset(&self) -> &Arc<Ruleset> {
        &self.ruleset
    }

    pub fn world_actor(&self) -> ActorId {
        self.world_actor
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn rng_state(&self) -> u64 {
        self.rng.state()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Assembles an actor of `actor_type` and fires its creation
    /// notifications. The actor is not yet in the world.
    pub fn create_actor(
        &mut self,
        actor_type: &str,
        owner: PlayerId,
        init: &InitValues,
    ) -> Result<ActorId, WorldError> {
        if self.players.get(owner).is_none() {
            return Err(WorldError::UnknownPlayer(owner));
        }
        let template = Arc::clone(self.ruleset.get(actor_type)?);
        self.create_from_template(template, owner, init)
    }

    fn create_from_template(
        &mut self,
        template: Arc<ActorTemplate>,
        owner: PlayerId,
        init: &InitValues,
    ) -> Result<ActorId, WorldError> {
        let id = ActorId(self.next_actor_id);
        self.next_actor_id += 1;

        let store = TraitStore::assemble(&template, init, id, owner).map_err(|err| {
            warn!(
                target: "rts_core::world",
                actor = %id,
                actor_type = template.name(),
                error = %err,
                "actor assembly failed"
            );
            err
        })?;

        trace!(
            target: "rts_core::world",
            actor = %id,
            actor_type = template.name(),
            owner = %owner,
            traits = store.len(),
            "actor assembled"
        );
        self.actors.insert(id, Actor::new(id, template, owner, store));
        self.advance(id, Lifecycle::Created)?;
        self.fan_out(id, Capability::NotifyCreated, |t, ctx| {
            if let Some(n) = t.as_notify_created_mut() {
                n.created(ctx);
            }
        });
        Ok(id)
    }

    pub fn add_to_world(&mut self, id: ActorId) -> Result<(), WorldError> {
        self.advance(id, Lifecycle::InWorld)?;
        self.refresh_occupancy(id);
        self.fan_out(id, Capability::NotifyAddedToWorld, |t, ctx| {
            if let Some(n) = t.as_notify_added_to_world_mut() {
                n.added_to_world(ctx);
            }
        });
        Ok(())
    }

    /// Creates an actor and adds it to the world.
    pub fn spawn(
        &mut self,
        actor_type: &str,
        owner: PlayerId,
        init: &InitValues,
    ) -> Result<ActorId, WorldError> {
        let id = self.create_actor(actor_type, owner, init)?;
        self.add_to_world(id)?;
        Ok(id)
    }

    pub fn remove_from_world(&mut self, id: ActorId) -> Result<(), WorldError> {
        self.advance(id, Lifecycle::Removed)?;
        self.occupancy.remove(id);
        self.fan_out(id, Capability::NotifyRemovedFromWorld, |t, ctx| {
            if let Some(n) = t.as_notify_removed_from_world_mut() {
                n.removed_from_world(ctx);
            }
        });
        Ok(())
    }

    /// Disposes `id`, removing it from the world first if needed. Its
    /// activities are cancelled and it receives no further callbacks.
    pub fn dispose(&mut self, id: ActorId) -> Result<(), WorldError> {
        let actor = self.actors.get(&id).ok_or(WorldError::UnknownActor(id))?;
        if actor.disposing {
            return Ok(());
        }
        if actor.lifecycle == Lifecycle::InWorld {
            self.remove_from_world(id)?;
        }

        // A removal hook may already have disposed the actor.
        let Some(actor) = self.actors.get_mut(&id) else {
            return Ok(());
        };
        if actor.disposing {
            return Ok(());
        }
        if !actor.lifecycle.can_advance_to(Lifecycle::Disposed) {
            return Err(WorldError::InvalidTransition {
                actor: id,
                from: actor.lifecycle,
                to: Lifecycle::Disposed,
            });
        }
        actor.disposing = true;

        self.fan_out(id, Capability::NotifyActorDisposing, |t, ctx| {
            if let Some(n) = t.as_notify_disposing_mut() {
                n.disposing(ctx);
            }
        });

        if let Some(mut actor) = self.actors.remove(&id) {
            for activity in actor.activities.iter_mut() {
                activity.cancel();
            }
            actor.activities.clear();
            actor.lifecycle = Lifecycle::Disposed;
            debug!(
                target: "rts_core::world",
                actor = %id,
                actor_type = actor.template.name(),
                "actor disposed"
            );
        }
        self.occupancy.remove(id);
        Ok(())
    }

    /// Like [`dispose`](Self::dispose) but a stale id is not an error.
    pub fn destroy(&mut self, id: ActorId) -> Result<(), WorldError> {
        if !self.actors.contains_key(&id) {
            trace!(target: "rts_core::world", actor = %id, "destroy of stale actor ignored");
            return Ok(());
        }
        self.dispose(id)
    }

    /// Disposes every actor in id order. The world actor goes last.
    pub fn shutdown(&mut self) {
        let ids: Vec<ActorId> = self
            .actors
            .keys()
            .copied()
            .filter(|id| *id != self.world_actor)
            .chain(std::iter::once(self.world_actor))
            .collect();
        for id in ids {
            if let Err(err) = self.destroy(id) {
                error!(target: "rts_core::world", actor = %id, error = %err, "dispose failed during shutdown");
            }
        }
        debug!(target: "rts_core::world", tick = %self.tick, "world shut down");
    }

    fn advance(&mut self, id: ActorId, to: Lifecycle) -> Result<(), WorldError> {
        let actor = self.actors.get_mut(&id).ok_or(WorldError::UnknownActor(id))?;
        if actor.disposing || !actor.lifecycle.can_advance_to(to) {
            return Err(WorldError::InvalidTransition {
                actor: id,
                from: actor.lifecycle,
                to,
            });
        }
        trace!(
            target: "rts_core::world",
            actor = %id,
            from = %actor.lifecycle,
            to = %to,
            "lifecycle transition"
        );
        actor.lifecycle = to;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------

    /// Advances the simulation by one tick: activities of every in-world
    /// actor, then every `Tick` implementer, both in ascending actor id and
    /// registry order. Actors spawned during the tick first run on the next.
    pub fn tick(&mut self) {
        let ids = self.in_world_ids();
        for &id in &ids {
            if self.is_in_world(id) {
                self.tick_activities(id);
            }
        }
        for &id in &ids {
            if self.is_in_world(id) {
                self.fan_out(id, Capability::Tick, |t, ctx| {
                    if let Some(t) = t.as_tick_mut() {
                        t.tick(ctx);
                    }
                });
            }
        }
        trace!(target: "rts_core::world", tick = %self.tick, actors = ids.len(), "tick complete");
        self.tick = self.tick + 1;
    }

    fn tick_activities(&mut self, id: ActorId) {
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        let Some(mut activity) = actor.activities.pop_front() else {
            self.fan_out(id, Capability::NotifyIdle, |t, ctx| {
                if let Some(n) = t.as_notify_idle_mut() {
                    n.tick_idle(ctx);
                }
            });
            return;
        };
        actor.activity_in_flight = true;

        let mut effects = Vec::new();
        let state = {
            let (view, rng) = self.split();
            let mut ctx = TraitContext::new(id, None, view, rng, &mut effects);
            activity.tick(&mut ctx)
        };

        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        actor.activity_in_flight = false;
        match state {
            // Back at the front before effects run, so a superseding order
            // emitted by this very tick cancels it.
            ActivityState::Running => actor.activities.push_front(activity),
            ActivityState::Done => {
                trace!(target: "rts_core::world", actor = %id, activity = activity.name(), "activity done");
            }
        }

        // An effect that empties a non-empty queue notifies on its own.
        let finished_last = state == ActivityState::Done && actor.is_idle();
        self.apply_effects(id, effects);

        if finished_last && self.actors.get(&id).is_some_and(Actor::is_idle) {
            self.notify_becoming_idle(id);
        }
    }

    fn notify_becoming_idle(&mut self, id: ActorId) {
        self.fan_out(id, Capability::NotifyBecomingIdle, |t, ctx| {
            if let Some(n) = t.as_notify_becoming_idle_mut() {
                n.becoming_idle(ctx);
            }
        });
    }

    /// Appends `activity`, or with `queued == false` cancels the queue and
    /// makes it the only activity.
    pub fn queue_activity(
        &mut self,
        id: ActorId,
        activity: Box<dyn Activity>,
        queued: bool,
    ) -> Result<(), WorldError> {
        let max = self.config.max_queued_activities;
        let actor = self.actors.get_mut(&id).ok_or(WorldError::UnknownActor(id))?;
        let was_busy = !actor.is_idle();
        if !queued {
            for current in actor.activities.iter_mut() {
                current.cancel();
            }
            actor.activities.clear();
        }
        if actor.activities.len() >= max {
            warn!(
                target: "rts_core::world",
                actor = %id,
                activity = activity.name(),
                max,
                "activity queue full, dropping activity"
            );
            if was_busy && actor.is_idle() {
                self.notify_becoming_idle(id);
            }
            return Ok(());
        }
        trace!(target: "rts_core::world", actor = %id, activity = activity.name(), queued, "activity queued");
        actor.activities.push_back(activity);
        Ok(())
    }

    /// Cancels every queued activity. Emptying a non-empty queue fires
    /// `NotifyBecomingIdle` once.
    pub fn cancel_activities(&mut self, id: ActorId) -> Result<(), WorldError> {
        let actor = self.actors.get_mut(&id).ok_or(WorldError::UnknownActor(id))?;
        let was_busy = !actor.is_idle();
        for activity in actor.activities.iter_mut() {
            activity.cancel();
        }
        actor.activities.clear();
        if was_busy && actor.is_idle() {
            self.notify_becoming_idle(id);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Spatial
    // ------------------------------------------------------------------

    /// Moves the actor's unique `Positionable` and refreshes occupancy.
    pub fn set_position(&mut self, id: ActorId, cell: CellPos) -> Result<(), WorldError> {
        let actor = self.actors.get_mut(&id).ok_or(WorldError::UnknownActor(id))?;
        let index = actor.store.single(Capability::Positionable)?;
        if let Some(positionable) = actor
            .store
            .get_mut(index)
            .and_then(|t| t.as_positionable_mut())
        {
            positionable.set_position(cell);
        }
        if actor.lifecycle == Lifecycle::InWorld {
            self.refresh_occupancy(id);
        }
        Ok(())
    }

    pub fn set_facing(&mut self, id: ActorId, facing: i32) -> Result<(), WorldError> {
        let actor = self.actors.get_mut(&id).ok_or(WorldError::UnknownActor(id))?;
        let index = actor.store.single(Capability::Facing)?;
        if let Some(f) = actor.store.get_mut(index).and_then(|t| t.as_facing_mut()) {
            f.set_facing(facing);
        }
        Ok(())
    }

    fn refresh_occupancy(&mut self, id: ActorId) {
        let cells = self
            .actors
            .get(&id)
            .and_then(|a| a.store.unique(Capability::OccupySpace, |t| t.as_occupy_space()))
            .map(|o| o.occupied_cells())
            .unwrap_or_default();
        self.occupancy.add(id, cells);
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn is_in_world(&self, id: ActorId) -> bool {
        self.actors
            .get(&id)
            .is_some_and(|a| a.lifecycle == Lifecycle::InWorld && !a.disposing)
    }

    fn in_world_ids(&self) -> Vec<ActorId> {
        self.actors
            .values()
            .filter(|a| a.lifecycle == Lifecycle::InWorld && !a.disposing)
            .map(|a| a.id)
            .collect()
    }

    /// Runs `f` on one trait of `id`, then applies the effects it emitted.
    fn dispatch<F>(&mut self, id: ActorId, index: TraitIndex, f: F)
    where
        F: FnOnce(&mut dyn ActorTrait, &mut TraitContext<'_>),
    {
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        let Some(mut instance) = actor.store.take(index) else {
            trace!(target: "rts_core::world", actor = %id, trait_index = %index, "trait busy, dispatch skipped");
            return;
        };

        let mut effects = Vec::new();
        {
            let (view, rng) = self.split();
            let mut ctx = TraitContext::new(id, Some(index), view, rng, &mut effects);
            f(&mut *instance, &mut ctx);
        }

        if let Some(actor) = self.actors.get_mut(&id) {
            actor.store.restore(index, instance);
        }
        self.apply_effects(id, effects);
    }

    /// Dispatches to every implementer of `capability` on `id` in registry
    /// order. Stops as soon as the actor is gone.
    fn fan_out<F>(&mut self, id: ActorId, capability: Capability, mut f: F)
    where
        F: FnMut(&mut dyn ActorTrait, &mut TraitContext<'_>),
    {
        let Some(actor) = self.actors.get(&id) else {
            return;
        };
        let implementers = actor.store.implementers(capability).to_vec();
        for index in implementers {
            if !self.actors.contains_key(&id) {
                break;
            }
            self.dispatch(id, index, &mut f);
        }
    }

    /// [`fan_out`](Self::fan_out) over every in-world actor in id order.
    fn fan_out_all<F>(&mut self, capability: Capability, mut f: F)
    where
        F: FnMut(&mut dyn ActorTrait, &mut TraitContext<'_>),
    {
        for id in self.in_world_ids() {
            if self.is_in_world(id) {
                self.fan_out(id, capability, &mut f);
            }
        }
    }

    fn apply_effects(&mut self, origin: ActorId, effects: Vec<Effect>) {
        if effects.is_empty() {
            return;
        }
        if self.dispatch_depth >= self.config.max_dispatch_depth {
            error!(
                target: "rts_core::world",
                actor = %origin,
                depth = self.dispatch_depth,
                dropped = effects.len(),
                "dispatch depth limit reached, dropping effects"
            );
            return;
        }

        self.dispatch_depth += 1;
        for effect in effects {
            if !self.actors.contains_key(&origin) {
                trace!(target: "rts_core::world", actor = %origin, "origin disposed, dropping remaining effects");
                break;
            }
            self.apply_effect(origin, effect);
        }
        self.dispatch_depth -= 1;
    }

    // ------------------------------------------------------------------
    // Determinism
    // ------------------------------------------------------------------

    /// Digest of the simulation state compared across lockstep peers.
    pub fn sync_hash(&self) -> SyncHash {
        let mut hasher = SyncHasher::new();
        hasher.write_u64(self.tick.0);
        hasher.write_u64(self.rng.state());
        hasher.write_u32(self.next_actor_id);
        for actor in self.actors.values() {
            hasher.write_u32(actor.id.0);
            hasher.write_u8(actor.lifecycle.as_u8());
            hasher.write_u32(actor.owner.0);
            for (_, state) in actor
                .store
                .query(Capability::SyncState, |t| t.as_sync_state())
            {
                state.sync_state(&mut hasher);
            }
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests;
