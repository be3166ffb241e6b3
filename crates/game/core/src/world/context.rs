use std::fmt;

use crate::activity::Activity;
use crate::health::Warhead;
use crate::player::Stance;
use crate::rng::SimRng;
use crate::store::{InitValues, TraitIndex};
use crate::target::Target;
use crate::types::{ActorId, CellPos, PlayerId, Tick};
use crate::world::{ActorView, WorldView};

/// A world mutation requested by a trait or activity.
///
/// Effects are applied in emission order right after the emitting callback
/// returns. The emitting actor is the origin: it is the attacker of damage it
/// inflicts and the captor of actors it captures.
pub enum Effect {
    InflictDamage {
        target: Target,
        damage: i32,
        warhead: Option<Warhead>,
        ignore_modifiers: bool,
    },
    Kill {
        target: Target,
    },
    ChangeOwner {
        actor: ActorId,
        owner: PlayerId,
    },
    Capture {
        actor: ActorId,
        owner: PlayerId,
    },
    GrantUpgrade {
        actor: ActorId,
        upgrade: String,
    },
    RevokeUpgrade {
        actor: ActorId,
        upgrade: String,
    },
    QueueActivity {
        actor: ActorId,
        activity: Box<dyn Activity>,
        queued: bool,
    },
    CancelActivities {
        actor: ActorId,
    },
    SetPosition {
        actor: ActorId,
        cell: CellPos,
    },
    SetFacing {
        actor: ActorId,
        facing: i32,
    },
    /// Creates an actor and adds it to the world.
    Spawn {
        actor_type: String,
        owner: PlayerId,
        init: InitValues,
    },
    Destroy {
        actor: ActorId,
    },
    SetStance {
        player: PlayerId,
        other: PlayerId,
        stance: Stance,
    },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InflictDamage { .. } => "inflict_damage",
            Self::Kill { .. } => "kill",
            Self::ChangeOwner { .. } => "change_owner",
            Self::Capture { .. } => "capture",
            Self::GrantUpgrade { .. } => "grant_upgrade",
            Self::RevokeUpgrade { .. } => "revoke_upgrade",
            Self::QueueActivity { .. } => "queue_activity",
            Self::CancelActivities { .. } => "cancel_activities",
            Self::SetPosition { .. } => "set_position",
            Self::SetFacing { .. } => "set_facing",
            Self::Spawn { .. } => "spawn",
            Self::Destroy { .. } => "destroy",
            Self::SetStance { .. } => "set_stance",
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueActivity {
                actor,
                activity,
                queued,
            } => f
                .debug_struct("QueueActivity")
                .field("actor", actor)
                .field("activity", &activity.name())
                .field("queued", queued)
                .finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// Everything a dispatched callback may touch besides its own trait.
pub struct TraitContext<'w> {
    actor: ActorId,
    trait_index: Option<TraitIndex>,
    world: WorldView<'w>,
    rng: &'w mut SimRng,
    effects: &'w mut Vec<Effect>,
}

impl<'w> TraitContext<'w> {
    pub(crate) fn new(
        actor: ActorId,
        trait_index: Option<TraitIndex>,
        world: WorldView<'w>,
        rng: &'w mut SimRng,
        effects: &'w mut Vec<Effect>,
    ) -> Self {
        Self {
            actor,
            trait_index,
            world,
            rng,
            effects,
        }
    }

    pub fn actor_id(&self) -> ActorId {
        self.actor
    }

    /// Index of the running trait; `None` inside activities.
    pub fn trait_index(&self) -> Option<TraitIndex> {
        self.trait_index
    }

    /// The calling actor. Its running trait is detached and does not show
    /// up in queries.
    pub fn this(&self) -> Option<ActorView<'w>> {
        self.world.actor(self.actor)
    }

    pub fn owner(&self) -> PlayerId {
        self.this().map(|a| a.owner()).unwrap_or_default()
    }

    pub fn world(&self) -> &WorldView<'w> {
        &self.world
    }

    pub fn tick(&self) -> Tick {
        self.world.tick()
    }

    pub fn rng(&mut self) -> &mut SimRng {
        &mut *self.rng
    }

    pub fn emit(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn inflict_damage(&mut self, target: Target, damage: i32, warhead: Option<Warhead>) {
        self.emit(Effect::InflictDamage {
            target,
            damage,
            warhead,
            ignore_modifiers: false,
        });
    }

    pub fn kill(&mut self, target: Target) {
        self.emit(Effect::Kill { target });
    }

    pub fn grant_upgrade(&mut self, actor: ActorId, upgrade: &str) {
        self.emit(Effect::GrantUpgrade {
            actor,
            upgrade: upgrade.to_string(),
        });
    }

    pub fn revoke_upgrade(&mut self, actor: ActorId, upgrade: &str) {
        self.emit(Effect::RevokeUpgrade {
            actor,
            upgrade: upgrade.to_string(),
        });
    }

    /// Queues `activity` on the calling actor.
    pub fn queue_activity(&mut self, activity: Box<dyn Activity>, queued: bool) {
        self.emit(Effect::QueueActivity {
            actor: self.actor,
            activity,
            queued,
        });
    }

    pub fn cancel_activities(&mut self) {
        self.emit(Effect::CancelActivities { actor: self.actor });
    }

    pub fn set_position(&mut self, cell: CellPos) {
        self.emit(Effect::SetPosition {
            actor: self.actor,
            cell,
        });
    }

    pub fn set_facing(&mut self, facing: i32) {
        self.emit(Effect::SetFacing {
            actor: self.actor,
            facing,
        });
    }

    pub fn spawn(&mut self, actor_type: &str, owner: PlayerId, init: InitValues) {
        self.emit(Effect::Spawn {
            actor_type: actor_type.to_string(),
            owner,
            init,
        });
    }

    pub fn destroy(&mut self, actor: ActorId) {
        self.emit(Effect::Destroy { actor });
    }
}
