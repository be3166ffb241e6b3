//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, the lockstep exchange, replays
//! and the hosted world so clients can bubble them up with consistent
//! context.
use rts_core::{ClientId, SyncHash, WorldError};
use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("frame {frame}: client {client} reported {got}, local simulation has {expected}")]
    Desync {
        frame: u64,
        client: ClientId,
        expected: SyncHash,
        got: SyncHash,
    },

    #[error("client {0} is not part of this game")]
    UnknownClient(ClientId),

    #[error("client {0} already joined")]
    DuplicateClient(ClientId),

    #[error("client {client} sent frame {frame} twice")]
    DuplicateFrame { frame: u64, client: ClientId },

    #[error("client {client} sent frame {frame}, which already executed (next is {next})")]
    StaleFrame {
        frame: u64,
        client: ClientId,
        next: u64,
    },

    #[error("client {client} reported frame {frame}, more than {window} frames ahead of {next}")]
    SyncReportTooEarly {
        frame: u64,
        client: ClientId,
        next: u64,
        window: u64,
    },

    #[error("replay diverged at frame {frame}: recorded {expected}, replayed {got}")]
    ReplayDiverged {
        frame: u64,
        expected: SyncHash,
        got: SyncHash,
    },

    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires a ruleset before building")]
    MissingRuleset,

    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RuntimeError {
    /// True for errors that mean peers no longer agree on the game state.
    pub fn is_desync(&self) -> bool {
        matches!(self, Self::Desync { .. } | Self::ReplayDiverged { .. })
    }
}
