//! Notification, modifier, ownership and spatial contracts.
//!
//! Notification callbacks take `&mut self` plus a [`TraitContext`]: a trait
//! mutates its own fields directly and reaches anything else by emitting
//! effects. Modifier and query contracts take `&self` and read-only views.
//!
//! Contracts with richer surfaces live next to their data:
//! [`Health`](crate::Health), [`Facing`](crate::Facing),
//! [`Upgradable`](crate::Upgradable), the order contracts in
//! [`order`](crate::order) and the render/UI contracts in
//! [`render`](crate::render).
use crate::health::{AttackInfo, Warhead};
use crate::player::Stance;
use crate::types::{ActorId, CellPos, PlayerId, WorldPos};
use crate::world::{ActorView, TraitContext};

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Fired once, after every sibling trait has been constructed.
pub trait NotifyCreated {
    fn created(&mut self, ctx: &mut TraitContext<'_>);
}

pub trait NotifyAddedToWorld {
    fn added_to_world(&mut self, ctx: &mut TraitContext<'_>);
}

pub trait NotifyRemovedFromWorld {
    fn removed_from_world(&mut self, ctx: &mut TraitContext<'_>);
}

/// Last callback before the actor and its traits are dropped.
pub trait NotifyActorDisposing {
    fn disposing(&mut self, ctx: &mut TraitContext<'_>);
}

/// Fired on every in-world actor once the initial map population is done.
pub trait WorldLoaded {
    fn world_loaded(&mut self, ctx: &mut TraitContext<'_>);
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

pub trait Tickable {
    fn tick(&mut self, ctx: &mut TraitContext<'_>);
}

/// Fired once when the activity queue runs empty.
pub trait NotifyBecomingIdle {
    fn becoming_idle(&mut self, ctx: &mut TraitContext<'_>);
}

/// Fired on every tick the actor starts without an activity.
pub trait NotifyIdle {
    fn tick_idle(&mut self, ctx: &mut TraitContext<'_>);
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

pub trait NotifyDamage {
    fn damaged(&mut self, ctx: &mut TraitContext<'_>, attack: &AttackInfo);
}

pub trait NotifyDamageStateChanged {
    fn damage_state_changed(&mut self, ctx: &mut TraitContext<'_>, attack: &AttackInfo);
}

/// Notified on the attacker after it damaged `victim`.
pub trait NotifyAppliedDamage {
    fn applied_damage(&mut self, ctx: &mut TraitContext<'_>, victim: ActorId, attack: &AttackInfo);
}

pub trait NotifyKilled {
    fn killed(&mut self, ctx: &mut TraitContext<'_>, attack: &AttackInfo);
}

pub trait Targetable {
    fn target_types(&self) -> &[String];

    fn targetable_by(&self, _actor: &ActorView<'_>, _viewer: &ActorView<'_>) -> bool {
        true
    }

    fn requires_force_fire(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------
//
// Each modifier returns a percentage where 100 leaves the value unchanged.

pub trait DamageModifier {
    fn damage_modifier(&self, attacker: Option<&ActorView<'_>>, warhead: Option<&Warhead>) -> i32;
}

pub trait SpeedModifier {
    fn speed_modifier(&self) -> i32;
}

pub trait FirepowerModifier {
    fn firepower_modifier(&self) -> i32;
}

pub trait ReloadModifier {
    fn reload_modifier(&self) -> i32;
}

pub trait InaccuracyModifier {
    fn inaccuracy_modifier(&self) -> i32;
}

pub trait RangeModifier {
    fn range_modifier(&self) -> i32;
}

pub trait PowerModifier {
    fn power_modifier(&self) -> i32;
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

pub trait NotifyOwnerChanged {
    fn owner_changed(&mut self, ctx: &mut TraitContext<'_>, old: PlayerId, new: PlayerId);
}

pub trait NotifyCapture {
    fn captured(
        &mut self,
        ctx: &mut TraitContext<'_>,
        captor: ActorId,
        old: PlayerId,
        new: PlayerId,
    );
}

/// Fired world-wide when `player`'s stance toward `other` changes.
pub trait NotifyStanceChanged {
    fn stance_changed(
        &mut self,
        ctx: &mut TraitContext<'_>,
        player: PlayerId,
        other: PlayerId,
        old: Stance,
        new: Stance,
    );
}

/// Disguise-style owner override seen by other players.
pub trait EffectiveOwner {
    fn disguised(&self) -> bool;
    fn effective_owner(&self) -> PlayerId;
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

pub trait NotifyProduction {
    fn unit_produced(&mut self, ctx: &mut TraitContext<'_>, produced: ActorId, exit: CellPos);
}

/// Fired on every actor in the world after any production.
pub trait NotifyOtherProduction {
    fn unit_produced_by_other(
        &mut self,
        ctx: &mut TraitContext<'_>,
        producer: ActorId,
        produced: ActorId,
    );
}

pub trait NotifySold {
    fn selling(&mut self, ctx: &mut TraitContext<'_>);
    fn sold(&mut self, ctx: &mut TraitContext<'_>);
}

pub trait NotifyRepair {
    fn repairing(&mut self, ctx: &mut TraitContext<'_>, host: ActorId);
}

pub trait NotifyBuildComplete {
    fn building_complete(&mut self, ctx: &mut TraitContext<'_>);
}

pub trait NotifyInfiltrated {
    fn infiltrated(&mut self, ctx: &mut TraitContext<'_>, infiltrator: ActorId);
}

pub trait NotifyDiscovered {
    fn discovered(&mut self, ctx: &mut TraitContext<'_>, discoverer: PlayerId, play_notification: bool);
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

pub trait OccupySpace {
    fn top_left(&self) -> CellPos;
    fn center_position(&self) -> WorldPos;

    fn occupied_cells(&self) -> Vec<CellPos> {
        vec![self.top_left()]
    }
}

/// Movable placement. The world keeps cell occupancy in step when it applies
/// a position change.
pub trait Positionable: OccupySpace {
    fn set_position(&mut self, cell: CellPos);
}
