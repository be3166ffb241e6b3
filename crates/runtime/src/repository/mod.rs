//! Persistence for recorded games.

mod error;
pub mod replay;

pub use error::{RepositoryError, Result};
pub use replay::{
    PlayerSlot, REPLAY_VERSION, Replay, ReplayFrame, ReplayHeader, ReplayWriter, SpawnRecord,
};
