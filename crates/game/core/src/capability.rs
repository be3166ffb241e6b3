//! Capability contracts and the base actor trait.
//!
//! Each capability pairs a [`Capability`] tag with a contract trait and one or
//! two accessors on [`ActorTrait`]. A trait type opts into a contract by
//! overriding the accessor to return `Some(self)`. The table below is the
//! single source for the tag enum, the accessors and the capability test, so
//! the registry cannot disagree with the accessors.
//!
//! - `read` accessors serve queries made while the rest of the world is only
//!   borrowed (modifiers, render projections, order targeters).
//! - `write` accessors serve dispatched callbacks that receive a
//!   [`TraitContext`](crate::TraitContext).
use std::any::Any;

use crate::conditional::Upgradable;
use crate::contract::*;
use crate::facing::Facing;
use crate::health::Health;
use crate::order::{IssueOrder, ResolveOrder, ValidateOrder};
use crate::render::{
    DefaultVisibility, Pips, Render, RenderModifier, Tags, Tooltip, VisibilityModifier,
};
use crate::sync::SyncState;

/// Upcast helper so stores can hand out concrete trait types.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

macro_rules! capabilities {
    ($(
        $(#[$meta:meta])*
        $variant:ident => $contract:ident { $(read: $read:ident,)? $(write: $write:ident,)? }
    )+) => {
        /// Tag of a capability contract.
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
            strum::Display, strum::EnumIter, strum::EnumCount, strum::EnumString,
            strum::IntoStaticStr,
        )]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum Capability {
            $( $(#[$meta])* $variant, )+
        }

        /// A behavior component attached to an actor.
        ///
        /// Every accessor defaults to `None`; implementers override the ones
        /// matching the contracts they provide.
        pub trait ActorTrait: AsAny + Send {
            $(
                $(
                    #[doc = concat!("Shared access to the `", stringify!($contract), "` contract.")]
                    fn $read(&self) -> Option<&dyn $contract> {
                        None
                    }
                )?
                $(
                    #[doc = concat!("Exclusive access to the `", stringify!($contract), "` contract.")]
                    fn $write(&mut self) -> Option<&mut dyn $contract> {
                        None
                    }
                )?
            )+
        }

        /// Tests whether `instance` implements `capability`. Assembly calls
        /// this once per trait and capability.
        pub(crate) fn implements(instance: &mut dyn ActorTrait, capability: Capability) -> bool {
            match capability {
                $(
                    Capability::$variant => {
                        false $(|| instance.$read().is_some())? $(|| instance.$write().is_some())?
                    }
                )+
            }
        }
    };
}

capabilities! {
    // lifecycle
    NotifyCreated => NotifyCreated { write: as_notify_created_mut, }
    NotifyAddedToWorld => NotifyAddedToWorld { write: as_notify_added_to_world_mut, }
    NotifyRemovedFromWorld => NotifyRemovedFromWorld { write: as_notify_removed_from_world_mut, }
    NotifyActorDisposing => NotifyActorDisposing { write: as_notify_disposing_mut, }
    WorldLoaded => WorldLoaded { write: as_world_loaded_mut, }

    // simulation
    Tick => Tickable { write: as_tick_mut, }
    NotifyBecomingIdle => NotifyBecomingIdle { write: as_notify_becoming_idle_mut, }
    NotifyIdle => NotifyIdle { write: as_notify_idle_mut, }

    // combat
    /// Unique per actor.
    Health => Health { read: as_health, write: as_health_mut, }
    NotifyDamage => NotifyDamage { write: as_notify_damage_mut, }
    NotifyDamageStateChanged => NotifyDamageStateChanged { write: as_notify_damage_state_changed_mut, }
    NotifyAppliedDamage => NotifyAppliedDamage { write: as_notify_applied_damage_mut, }
    NotifyKilled => NotifyKilled { write: as_notify_killed_mut, }
    Targetable => Targetable { read: as_targetable, }

    // modifiers
    DamageModifier => DamageModifier { read: as_damage_modifier, }
    SpeedModifier => SpeedModifier { read: as_speed_modifier, }
    FirepowerModifier => FirepowerModifier { read: as_firepower_modifier, }
    ReloadModifier => ReloadModifier { read: as_reload_modifier, }
    InaccuracyModifier => InaccuracyModifier { read: as_inaccuracy_modifier, }
    RangeModifier => RangeModifier { read: as_range_modifier, }
    PowerModifier => PowerModifier { read: as_power_modifier, }

    // ownership
    NotifyOwnerChanged => NotifyOwnerChanged { write: as_notify_owner_changed_mut, }
    NotifyCapture => NotifyCapture { write: as_notify_capture_mut, }
    NotifyStanceChanged => NotifyStanceChanged { write: as_notify_stance_changed_mut, }
    /// Unique per actor.
    EffectiveOwner => EffectiveOwner { read: as_effective_owner, }

    // events
    NotifyProduction => NotifyProduction { write: as_notify_production_mut, }
    NotifyOtherProduction => NotifyOtherProduction { write: as_notify_other_production_mut, }
    NotifySold => NotifySold { write: as_notify_sold_mut, }
    NotifyRepair => NotifyRepair { write: as_notify_repair_mut, }
    NotifyBuildComplete => NotifyBuildComplete { write: as_notify_build_complete_mut, }
    NotifyInfiltrated => NotifyInfiltrated { write: as_notify_infiltrated_mut, }
    NotifyDiscovered => NotifyDiscovered { write: as_notify_discovered_mut, }

    // enablement
    Upgradable => Upgradable { read: as_upgradable, write: as_upgradable_mut, }

    // orders
    IssueOrder => IssueOrder { read: as_issue_order, }
    ResolveOrder => ResolveOrder { write: as_resolve_order_mut, }
    ValidateOrder => ValidateOrder { read: as_validate_order, }

    // rendering and UI
    Render => Render { read: as_render, }
    RenderModifier => RenderModifier { read: as_render_modifier, }
    Pips => Pips { read: as_pips, }
    Tags => Tags { read: as_tags, }
    Tooltip => Tooltip { read: as_tooltip, }

    // visibility
    /// Unique per actor.
    DefaultVisibility => DefaultVisibility { read: as_default_visibility, }
    VisibilityModifier => VisibilityModifier { read: as_visibility_modifier, }

    // spatial
    /// Unique per actor.
    OccupySpace => OccupySpace { read: as_occupy_space, }
    /// Unique per actor.
    Positionable => Positionable { write: as_positionable_mut, }
    /// Unique per actor.
    Facing => Facing { read: as_facing, write: as_facing_mut, }

    // determinism
    SyncState => SyncState { read: as_sync_state, }
}

impl Capability {
    /// Capabilities an actor may have at most one provider of.
    pub fn is_unique(self) -> bool {
        matches!(
            self,
            Self::Health
                | Self::Facing
                | Self::OccupySpace
                | Self::Positionable
                | Self::DefaultVisibility
                | Self::EffectiveOwner
        )
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}
