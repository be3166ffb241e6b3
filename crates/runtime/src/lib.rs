//! Lockstep runtime for the deterministic actor simulation.
//!
//! This crate hosts a [`rts_core::World`] inside a worker task and drives it
//! from order frames. Consumers embed [`Runtime`] to start a game, submit
//! frames and sync hashes through [`RuntimeHandle`], and subscribe to events.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`lockstep`] buffers frames, gates execution and detects desyncs
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`repository`] records and replays games
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod lockstep;
pub mod repository;
pub mod runtime;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use events::{Event, EventBus, FrameEvent, SessionEvent, SyncEvent, Topic};
pub use lockstep::{
    ExecutedFrame, FrameBatch, OrderFrame, OrderManager, SyncReport, execute_frame,
};
pub use repository::{
    PlayerSlot, REPLAY_VERSION, Replay, ReplayFrame, ReplayHeader, ReplayWriter, RepositoryError,
    SpawnRecord,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use workers::FrameStatus;
