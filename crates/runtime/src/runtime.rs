//! High-level runtime orchestrator.
//!
//! The runtime owns the simulation worker, wires up command/event channels,
//! and exposes a builder-based API for hosts to start a lockstep game.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rts_content::{ConfigLoader, LoadResult};
use rts_core::{ClientId, InitValues, PlayerId, Ruleset, SimConfig, World};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::events::EventBus;
use crate::lockstep::OrderManager;
use crate::repository::{PlayerSlot, ReplayHeader, ReplayWriter, SpawnRecord};
use crate::workers::{Command, SimulationWorker};

/// Runtime configuration shared across the orchestrator and workers.
///
/// Loadable from TOML; the simulation settings live in a `[sim]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub sim: SimConfig,
    /// Clients whose frames gate execution.
    pub clients: Vec<ClientId>,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Executed frames whose hashes are kept for late sync reports.
    pub hash_history: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            clients: vec![0],
            event_buffer_size: 100,
            command_buffer_size: 32,
            hash_history: OrderManager::DEFAULT_HASH_HISTORY,
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> LoadResult<Self> {
        ConfigLoader::load_as(path)
    }
}

/// Main runtime that hosts one lockstep game.
///
/// Design: Runtime owns the worker task.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    header: ReplayHeader,
    sim_worker_handle: JoinHandle<World>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Everything needed to rebuild the starting world.
    pub fn header(&self) -> &ReplayHeader {
        &self.header
    }

    /// Shutdown the runtime gracefully and hand back the world.
    ///
    /// Waits until every cloned [`RuntimeHandle`] has been dropped.
    pub async fn shutdown(self) -> Result<World> {
        drop(self.handle);

        self.sim_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    ruleset: Option<Arc<Ruleset>>,
    seed: u64,
    players: Vec<PlayerSlot>,
    setup: Vec<SpawnRecord>,
    content: Option<PathBuf>,
    replay_path: Option<PathBuf>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            ruleset: None,
            seed: 0,
            players: Vec::new(),
            setup: Vec::new(),
            content: None,
            replay_path: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required ruleset
    pub fn ruleset(mut self, ruleset: Arc<Ruleset>) -> Self {
        self.ruleset = Some(ruleset);
        self
    }

    /// Seed for the simulation RNG, recorded in the replay header
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Add a player slot. Slots are numbered from 1 in call order.
    pub fn player(mut self, name: &str, internal_name: &str) -> Self {
        self.players.push(PlayerSlot::new(name, internal_name));
        self
    }

    /// Place an actor before the first frame.
    pub fn spawn(mut self, actor_type: &str, owner: PlayerId, init: InitValues) -> Self {
        self.setup.push(SpawnRecord {
            actor_type: actor_type.to_string(),
            owner,
            init,
        });
        self
    }

    /// Content directory to note in the replay header
    pub fn content_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.content = Some(dir.into());
        self
    }

    /// Record every executed frame to a new replay file
    pub fn record_replay(mut self, path: impl Into<PathBuf>) -> Self {
        self.replay_path = Some(path.into());
        self
    }

    /// Build the runtime
    pub async fn build(self) -> Result<Runtime> {
        let ruleset = self.ruleset.ok_or(RuntimeError::MissingRuleset)?;

        let header = ReplayHeader {
            config: self.config.sim.clone(),
            content: self.content,
            setup: self.setup,
            ..ReplayHeader::new(self.seed, self.players, self.config.clients.clone())
        };
        let world = header.build_world(ruleset)?;

        let replay = match &self.replay_path {
            Some(path) => Some(ReplayWriter::create(path, &header)?),
            None => None,
        };

        let orders = OrderManager::new(self.config.clients.iter().copied())
            .with_hash_history(self.config.hash_history);

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let sim_worker = SimulationWorker::new(world, orders, command_rx, event_bus, replay);
        let sim_worker_handle = tokio::spawn(sim_worker.run());

        info!(
            target: "rts_runtime::worker",
            seed = header.seed,
            players = header.players.len(),
            clients = header.clients.len(),
            "runtime started"
        );

        Ok(Runtime {
            handle,
            header,
            sim_worker_handle,
        })
    }
}
