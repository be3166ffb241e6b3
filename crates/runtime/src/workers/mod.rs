//! Worker tasks that back the runtime orchestration.
//!
//! The simulation worker is the only owner of the world; everything else
//! talks to it through commands.

mod simulation;

pub use simulation::{Command, FrameStatus, SimulationWorker};
