//! Deterministic actor/trait simulation shared by every lockstep peer.
//!
//! `rts-core` is the mechanism underneath the game rules: actors are assembled
//! from independent traits, each opting into typed capability contracts, and
//! the [`World`] drives them through their lifecycle, ticks them in a fixed
//! order and fans notifications out depth-first. Everything here is
//! single-threaded and free of wall-clock or hash-order dependence, so two
//! peers fed the same orders compute the same [`SyncHash`].
//!
//! Content (concrete trait kinds, rulesets) lives in `rts-content`; the
//! lockstep driver lives in `rts-runtime`.
pub mod activity;
pub mod capability;
pub mod conditional;
pub mod config;
pub mod contract;
pub mod error;
pub mod facing;
pub mod health;
pub mod lifecycle;
pub mod modifier;
pub mod order;
pub mod player;
pub mod render;
pub mod rng;
pub mod store;
pub mod sync;
pub mod target;
pub mod types;
pub mod world;

pub use activity::{Activity, ActivityState};
pub use capability::{ActorTrait, AsAny, Capability};
pub use conditional::{Conditional, ConditionalInfo, EnablementChange, Upgradable};
pub use config::SimConfig;
pub use error::{AssemblyError, ErrorSeverity, GameError, MissingTraitError, WorldError};
pub use facing::{Facing, FacingInfo, FacingTrait};
pub use health::{
    AttackInfo, DamageState, DamageThresholds, Health, HealthChange, HealthInfo, HealthTrait,
    Warhead,
};
pub use lifecycle::Lifecycle;
pub use modifier::{ModifierAxis, apply_percentage_modifiers};
pub use order::{
    IssueOrder, Order, OrderTargeter, ResolveOrder, ResolvedOrder, TargetModifiers, ValidateOrder,
};
pub use player::{Player, Players, Stance};
pub use render::{ActorProjection, PipType, RenderSnapshot, Renderable, TagType};
pub use rng::SimRng;
pub use store::{
    ActorInitializer, ActorTemplate, InitValue, InitValues, Ruleset, TraitDeclaration, TraitIndex,
    TraitInfo, TraitStore,
};
pub use sync::{SyncHash, SyncHasher, SyncState};
pub use target::Target;
pub use types::{ActorId, CELL_SIZE, CellPos, ClientId, PlayerId, Tick, WorldPos, WorldVec};
pub use world::{
    Actor, ActorView, Effect, Occupancy, OrderOutcome, TraitContext, World, WorldView,
};
