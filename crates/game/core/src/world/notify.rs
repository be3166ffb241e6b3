//! World entry points that change shared state and fan the change out to
//! the matching notification contracts.
use tracing::{debug, trace};

use crate::capability::Capability;
use crate::conditional::EnablementChange;
use crate::error::WorldError;
use crate::health::{AttackInfo, DamageState, Warhead};
use crate::lifecycle::Lifecycle;
use crate::modifier::{ModifierAxis, apply_percentage_modifiers};
use crate::player::Stance;
use crate::store::TraitIndex;
use crate::target::Target;
use crate::types::{ActorId, CellPos, PlayerId};
use crate::world::World;

impl World {
    fn require_in_world(&self, id: ActorId) -> Result<(), WorldError> {
        match self.actors.get(&id) {
            Some(actor) if actor.lifecycle == Lifecycle::InWorld && !actor.disposing => Ok(()),
            Some(actor) => Err(WorldError::InvalidTransition {
                actor: id,
                from: actor.lifecycle,
                to: Lifecycle::InWorld,
            }),
            None => Err(WorldError::UnknownActor(id)),
        }
    }

    // ------------------------------------------------------------------
    // Combat
    // ------------------------------------------------------------------

    /// Applies `damage` to `victim`'s health. Unless `ignore_modifiers` is
    /// set, the attacker's firepower modifiers and the victim's damage
    /// modifiers scale it as one stack.
    ///
    /// Fans out `NotifyDamage`, then `NotifyDamageStateChanged` when the
    /// state changed, `NotifyAppliedDamage` on the attacker and finally
    /// `NotifyKilled` on death. Returns `None` when nothing was applied:
    /// the victim is gone, out of the world, has no health or is already
    /// dead.
    pub fn inflict_damage(
        &mut self,
        victim: ActorId,
        attacker: Target,
        damage: i32,
        warhead: Option<&Warhead>,
        ignore_modifiers: bool,
    ) -> Option<AttackInfo> {
        let (health_index, damage) = {
            let view = self.view();
            let victim_view = view.actor(victim).filter(|a| a.is_in_world())?;
            let health_index = victim_view.traits().single(Capability::Health).ok()?;
            if victim_view.is_dead() {
                return None;
            }
            let damage = if ignore_modifiers {
                damage
            } else {
                let attacker_view = attacker.actor_id().and_then(|id| view.actor(id));
                let mut stack = attacker_view
                    .map(|a| a.modifiers(ModifierAxis::Firepower))
                    .unwrap_or_default();
                stack.extend(victim_view.damage_modifiers(attacker_view.as_ref(), warhead));
                apply_percentage_modifiers(damage, stack)
            };
            (health_index, damage)
        };

        let change = self
            .actors
            .get_mut(&victim)?
            .store
            .get_mut(health_index)?
            .as_health_mut()?
            .apply_damage(damage)?;

        let attack = AttackInfo {
            damage: change.applied,
            attacker,
            warhead: warhead.cloned(),
            damage_state: change.current,
            previous_damage_state: change.previous,
        };
        debug!(
            target: "rts_core::world",
            victim = %victim,
            damage = change.applied,
            state = %change.current,
            "damage applied"
        );

        self.fan_out(victim, Capability::NotifyDamage, |t, ctx| {
            if let Some(n) = t.as_notify_damage_mut() {
                n.damaged(ctx, &attack);
            }
        });
        if change.current != change.previous {
            self.fan_out(victim, Capability::NotifyDamageStateChanged, |t, ctx| {
                if let Some(n) = t.as_notify_damage_state_changed_mut() {
                    n.damage_state_changed(ctx, &attack);
                }
            });
        }
        if let Some(attacker_id) = attacker.actor_id() {
            self.fan_out(attacker_id, Capability::NotifyAppliedDamage, |t, ctx| {
                if let Some(n) = t.as_notify_applied_damage_mut() {
                    n.applied_damage(ctx, victim, &attack);
                }
            });
        }
        if change.current == DamageState::Dead {
            self.notify_killed(victim, &attack);
        }
        Some(attack)
    }

    /// Deals exactly the victim's remaining HP, bypassing modifiers.
    pub fn kill(&mut self, victim: ActorId, attacker: Target) -> Option<AttackInfo> {
        let hp = self.view().actor(victim)?.health()?.hp();
        self.inflict_damage(victim, attacker, hp, None, true)
    }

    fn notify_killed(&mut self, victim: ActorId, attack: &AttackInfo) {
        self.fan_out(victim, Capability::NotifyKilled, |t, ctx| {
            if let Some(n) = t.as_notify_killed_mut() {
                n.killed(ctx, attack);
            }
        });

        let remove = self
            .view()
            .actor(victim)
            .and_then(|a| a.health())
            .is_some_and(|h| h.remove_on_death());
        if !remove {
            return;
        }
        if let Err(err) = self.destroy(victim) {
            debug!(target: "rts_core::world", actor = %victim, error = %err, "removal on death failed");
        }
    }

    // ------------------------------------------------------------------
    // Ownership
    // ------------------------------------------------------------------

    pub fn change_owner(&mut self, id: ActorId, owner: PlayerId) -> Result<(), WorldError> {
        if self.players.get(owner).is_none() {
            return Err(WorldError::UnknownPlayer(owner));
        }
        let actor = self.actors.get_mut(&id).ok_or(WorldError::UnknownActor(id))?;
        let old = actor.owner;
        if old == owner {
            return Ok(());
        }
        actor.owner = owner;
        debug!(target: "rts_core::world", actor = %id, old = %old, new = %owner, "owner changed");

        self.fan_out(id, Capability::NotifyOwnerChanged, |t, ctx| {
            if let Some(n) = t.as_notify_owner_changed_mut() {
                n.owner_changed(ctx, old, owner);
            }
        });
        Ok(())
    }

    /// Transfers `id` to `owner` on behalf of `captor`. Owner-change
    /// notifications run before capture notifications.
    pub fn capture(
        &mut self,
        id: ActorId,
        captor: ActorId,
        owner: PlayerId,
    ) -> Result<(), WorldError> {
        let old = self.actors.get(&id).ok_or(WorldError::UnknownActor(id))?.owner;
        self.change_owner(id, owner)?;
        self.fan_out(id, Capability::NotifyCapture, |t, ctx| {
            if let Some(n) = t.as_notify_capture_mut() {
                n.captured(ctx, captor, old, owner);
            }
        });
        Ok(())
    }

    /// Sets `player`'s stance toward `other`. The change is one-directional
    /// and fans out to every in-world actor.
    pub fn set_stance(
        &mut self,
        player: PlayerId,
        other: PlayerId,
        stance: Stance,
    ) -> Result<(), WorldError> {
        for id in [player, other] {
            if self.players.get(id).is_none() {
                return Err(WorldError::UnknownPlayer(id));
            }
        }
        let Some(old) = self.players.set_stance(player, other, stance) else {
            return Ok(());
        };
        debug!(
            target: "rts_core::world",
            player = %player,
            other = %other,
            old = ?old,
            new = ?stance,
            "stance changed"
        );
        self.fan_out_all(Capability::NotifyStanceChanged, |t, ctx| {
            if let Some(n) = t.as_notify_stance_changed_mut() {
                n.stance_changed(ctx, player, other, old, stance);
            }
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Tells `producer` it built `produced`, then tells every in-world actor.
    pub fn notify_production(
        &mut self,
        producer: ActorId,
        produced: ActorId,
        exit: CellPos,
    ) -> Result<(), WorldError> {
        self.require_in_world(producer)?;
        self.fan_out(producer, Capability::NotifyProduction, |t, ctx| {
            if let Some(n) = t.as_notify_production_mut() {
                n.unit_produced(ctx, produced, exit);
            }
        });
        self.fan_out_all(Capability::NotifyOtherProduction, |t, ctx| {
            if let Some(n) = t.as_notify_other_production_mut() {
                n.unit_produced_by_other(ctx, producer, produced);
            }
        });
        Ok(())
    }

    /// Runs the selling and sold hooks, then disposes the actor.
    pub fn sell(&mut self, id: ActorId) -> Result<(), WorldError> {
        self.require_in_world(id)?;
        self.fan_out(id, Capability::NotifySold, |t, ctx| {
            if let Some(n) = t.as_notify_sold_mut() {
                n.selling(ctx);
            }
        });
        self.fan_out(id, Capability::NotifySold, |t, ctx| {
            if let Some(n) = t.as_notify_sold_mut() {
                n.sold(ctx);
            }
        });
        self.destroy(id)
    }

    pub fn notify_repair(&mut self, id: ActorId, host: ActorId) -> Result<(), WorldError> {
        self.require_in_world(id)?;
        self.fan_out(id, Capability::NotifyRepair, |t, ctx| {
            if let Some(n) = t.as_notify_repair_mut() {
                n.repairing(ctx, host);
            }
        });
        Ok(())
    }

    pub fn notify_build_complete(&mut self, id: ActorId) -> Result<(), WorldError> {
        self.require_in_world(id)?;
        self.fan_out(id, Capability::NotifyBuildComplete, |t, ctx| {
            if let Some(n) = t.as_notify_build_complete_mut() {
                n.building_complete(ctx);
            }
        });
        Ok(())
    }

    pub fn notify_infiltrated(
        &mut self,
        id: ActorId,
        infiltrator: ActorId,
    ) -> Result<(), WorldError> {
        self.require_in_world(id)?;
        self.fan_out(id, Capability::NotifyInfiltrated, |t, ctx| {
            if let Some(n) = t.as_notify_infiltrated_mut() {
                n.infiltrated(ctx, infiltrator);
            }
        });
        Ok(())
    }

    pub fn notify_discovered(
        &mut self,
        id: ActorId,
        discoverer: PlayerId,
        play_notification: bool,
    ) -> Result<(), WorldError> {
        self.require_in_world(id)?;
        self.fan_out(id, Capability::NotifyDiscovered, |t, ctx| {
            if let Some(n) = t.as_notify_discovered_mut() {
                n.discovered(ctx, discoverer, play_notification);
            }
        });
        Ok(())
    }

    /// Fired once by the host after the initial actors are placed.
    pub fn world_loaded(&mut self) {
        self.fan_out_all(Capability::WorldLoaded, |t, ctx| {
            if let Some(n) = t.as_world_loaded_mut() {
                n.world_loaded(ctx);
            }
        });
    }

    // ------------------------------------------------------------------
    // Upgrades
    // ------------------------------------------------------------------

    /// Raises the level of every trait on `id` listening to `upgrade` that
    /// still accepts grants. Returns whether any trait accepted.
    pub fn grant_upgrade(&mut self, id: ActorId, upgrade: &str) -> bool {
        let Some(actor) = self.actors.get(&id) else {
            return false;
        };
        let targets: Vec<(TraitIndex, u32)> = actor
            .store
            .query(Capability::Upgradable, |t| t.as_upgradable())
            .filter(|(_, u)| u.conditional().accepts_grant(upgrade))
            .map(|(index, u)| (index, u.conditional().level() + 1))
            .collect();
        for &(index, level) in &targets {
            self.set_trait_level(id, index, level);
        }
        trace!(target: "rts_core::world", actor = %id, upgrade, accepted = targets.len(), "upgrade granted");
        !targets.is_empty()
    }

    /// Lowers the level of every trait on `id` listening to `upgrade`.
    pub fn revoke_upgrade(&mut self, id: ActorId, upgrade: &str) -> bool {
        let Some(actor) = self.actors.get(&id) else {
            return false;
        };
        let targets: Vec<(TraitIndex, u32)> = actor
            .store
            .query(Capability::Upgradable, |t| t.as_upgradable())
            .filter(|(_, u)| u.conditional().listens_to(upgrade) && u.conditional().level() > 0)
            .map(|(index, u)| (index, u.conditional().level() - 1))
            .collect();
        for &(index, level) in &targets {
            self.set_trait_level(id, index, level);
        }
        trace!(target: "rts_core::world", actor = %id, upgrade, revoked = targets.len(), "upgrade revoked");
        !targets.is_empty()
    }

    /// Sets one upgradable trait's level directly. `Ok(None)` when the
    /// trait is not upgradable or no boundary was crossed.
    pub fn set_upgrade_level(
        &mut self,
        id: ActorId,
        index: TraitIndex,
        level: u32,
    ) -> Result<Option<EnablementChange>, WorldError> {
        if !self.actors.contains_key(&id) {
            return Err(WorldError::UnknownActor(id));
        }
        Ok(self.set_trait_level(id, index, level))
    }

    fn set_trait_level(
        &mut self,
        id: ActorId,
        index: TraitIndex,
        level: u32,
    ) -> Option<EnablementChange> {
        let change = self
            .actors
            .get_mut(&id)?
            .store
            .get_mut(index)?
            .as_upgradable_mut()?
            .conditional_mut()
            .set_level(level);

        match change {
            Some(EnablementChange::Enabled) => {
                debug!(target: "rts_core::world", actor = %id, trait_index = %index, level, "trait enabled");
                self.dispatch(id, index, |t, ctx| {
                    if let Some(u) = t.as_upgradable_mut() {
                        u.upgrade_enabled(ctx);
                    }
                });
            }
            Some(EnablementChange::Disabled) => {
                debug!(target: "rts_core::world", actor = %id, trait_index = %index, level, "trait disabled");
                self.dispatch(id, index, |t, ctx| {
                    if let Some(u) = t.as_upgradable_mut() {
                        u.upgrade_disabled(ctx);
                    }
                });
            }
            None => {}
        }
        change
    }
}
