use tracing::{debug, trace};

use crate::target::Target;
use crate::types::ActorId;
use crate::world::{Effect, World};

impl World {
    /// Applies one effect on behalf of `origin`. Effects aimed at stale
    /// targets are dropped; failing world calls are logged, not raised.
    pub(super) fn apply_effect(&mut self, origin: ActorId, effect: Effect) {
        let name = effect.name();
        trace!(target: "rts_core::world", actor = %origin, effect = name, "applying effect");

        let result = match effect {
            Effect::InflictDamage {
                target,
                damage,
                warhead,
                ignore_modifiers,
            } => {
                match self.resolve_target(&target) {
                    Some(victim) => {
                        self.inflict_damage(
                            victim,
                            Target::Actor(origin),
                            damage,
                            warhead.as_ref(),
                            ignore_modifiers,
                        );
                    }
                    None => trace!(target: "rts_core::world", actor = %origin, "damage target no longer valid"),
                }
                Ok(())
            }
            Effect::Kill { target } => {
                if let Some(victim) = self.resolve_target(&target) {
                    self.kill(victim, Target::Actor(origin));
                }
                Ok(())
            }
            Effect::ChangeOwner { actor, owner } => self.change_owner(actor, owner),
            Effect::Capture { actor, owner } => self.capture(actor, origin, owner),
            Effect::GrantUpgrade { actor, upgrade } => {
                self.grant_upgrade(actor, &upgrade);
                Ok(())
            }
            Effect::RevokeUpgrade { actor, upgrade } => {
                self.revoke_upgrade(actor, &upgrade);
                Ok(())
            }
            Effect::QueueActivity {
                actor,
                activity,
                queued,
            } => self.queue_activity(actor, activity, queued),
            Effect::CancelActivities { actor } => self.cancel_activities(actor),
            Effect::SetPosition { actor, cell } => self.set_position(actor, cell),
            Effect::SetFacing { actor, facing } => self.set_facing(actor, facing),
            Effect::Spawn {
                actor_type,
                owner,
                init,
            } => self.spawn(&actor_type, owner, &init).map(|_| ()),
            Effect::Destroy { actor } => self.destroy(actor),
            Effect::SetStance {
                player,
                other,
                stance,
            } => self.set_stance(player, other, stance),
        };

        if let Err(err) = result {
            debug!(
                target: "rts_core::world",
                actor = %origin,
                effect = name,
                error = %err,
                "effect rejected"
            );
        }
    }

    fn resolve_target(&self, target: &Target) -> Option<ActorId> {
        target.resolve(&self.view()).map(|actor| actor.id())
    }
}
