//! JSON-lines replay files.
//!
//! ```text
//! {"type":"header","version":1,"seed":7,...}
//! {"type":"frame","frame":1,"orders":[...],"sync_hash":[...]}
//! {"type":"frame","frame":2,"orders":[],"sync_hash":[...]}
//! ```
//!
//! The header carries everything needed to rebuild the starting world except
//! the ruleset itself, which is referenced by its content directory. Each
//! frame line holds the orders in the order they were applied and the sync
//! hash the recording peer computed afterwards.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rts_core::{
    ClientId, InitValues, Order, PlayerId, Players, Ruleset, SimConfig, SyncHash, World,
    WorldError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{RepositoryError, Result};
use crate::lockstep::{ExecutedFrame, execute_frame};

pub const REPLAY_VERSION: u32 = 1;

/// Player table entry, in slot order after the neutral player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub name: String,
    pub internal_name: String,
    #[serde(default)]
    pub non_combatant: bool,
}

impl PlayerSlot {
    pub fn new(name: &str, internal_name: &str) -> Self {
        Self {
            name: name.to_string(),
            internal_name: internal_name.to_string(),
            non_combatant: false,
        }
    }
}

/// An actor placed before the first frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRecord {
    pub actor_type: String,
    pub owner: PlayerId,
    #[serde(default)]
    pub init: InitValues,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayHeader {
    pub version: u32,
    pub seed: u64,
    #[serde(default)]
    pub config: SimConfig,
    pub players: Vec<PlayerSlot>,
    pub clients: Vec<ClientId>,
    /// Content directory the ruleset was loaded from.
    #[serde(default)]
    pub content: Option<PathBuf>,
    #[serde(default)]
    pub setup: Vec<SpawnRecord>,
}

impl ReplayHeader {
    pub fn new(seed: u64, players: Vec<PlayerSlot>, clients: Vec<ClientId>) -> Self {
        Self {
            version: REPLAY_VERSION,
            seed,
            config: SimConfig::default(),
            players,
            clients,
            content: None,
            setup: Vec::new(),
        }
    }

    pub fn player_table(&self) -> std::result::Result<Players, WorldError> {
        let mut players = Players::new();
        for slot in &self.players {
            if slot.non_combatant {
                players.add_non_combatant(&slot.name, &slot.internal_name)?;
            } else {
                players.add(&slot.name, &slot.internal_name)?;
            }
        }
        Ok(players)
    }

    /// Builds the starting world: players, world actor and setup spawns.
    pub fn build_world(&self, ruleset: Arc<Ruleset>) -> std::result::Result<World, WorldError> {
        let mut world = World::new(ruleset, self.player_table()?, self.config.clone(), self.seed)?;
        for spawn in &self.setup {
            world.spawn(&spawn.actor_type, spawn.owner, &spawn.init)?;
        }
        Ok(world)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub frame: u64,
    pub orders: Vec<Order>,
    pub sync_hash: SyncHash,
}

impl From<&ExecutedFrame> for ReplayFrame {
    fn from(executed: &ExecutedFrame) -> Self {
        Self {
            frame: executed.frame,
            orders: executed.orders.clone(),
            sync_hash: executed.sync_hash,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Record {
    Header(ReplayHeader),
    Frame(ReplayFrame),
}

/// Appends frames to a new replay file.
pub struct ReplayWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    frames: u64,
}

impl ReplayWriter {
    /// Creates the file and writes the header.
    ///
    /// # Errors
    ///
    /// Returns error if the file already exists (prevents accidental overwrites).
    pub fn create(path: impl AsRef<Path>, header: &ReplayHeader) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if path.exists() {
            return Err(RepositoryError::LogAlreadyExists(
                path.display().to_string(),
            ));
        }

        let file = OpenOptions::new().create_new(true).write(true).open(path)?;
        let mut writer = Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            frames: 0,
        };
        writer.write_record(&Record::Header(header.clone()))?;
        debug!(target: "rts_runtime::replay", path = %path.display(), "replay created");
        Ok(writer)
    }

    /// Appends one frame and flushes it to disk.
    pub fn append(&mut self, frame: &ReplayFrame) -> Result<()> {
        self.write_record(&Record::Frame(frame.clone()))?;
        self.frames += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    fn write_record(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// A fully loaded replay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replay {
    pub header: ReplayHeader,
    pub frames: Vec<ReplayFrame>,
}

impl Replay {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);

        let mut header = None;
        let mut frames = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record =
                serde_json::from_str(&line).map_err(|e| RepositoryError::Json {
                    line: index + 1,
                    message: e.to_string(),
                })?;
            match (record, header.is_some()) {
                (Record::Header(h), false) => {
                    if h.version != REPLAY_VERSION {
                        return Err(RepositoryError::UnsupportedVersion {
                            found: h.version,
                            expected: REPLAY_VERSION,
                        });
                    }
                    header = Some(h);
                }
                (Record::Header(_), true) => {
                    return Err(RepositoryError::CorruptedData(format!(
                        "second header at line {}",
                        index + 1
                    )));
                }
                (Record::Frame(_), false) => {
                    return Err(RepositoryError::CorruptedData(
                        "frame before header".to_string(),
                    ));
                }
                (Record::Frame(frame), true) => frames.push(frame),
            }
        }

        let header = header
            .ok_or_else(|| RepositoryError::CorruptedData("missing header".to_string()))?;
        info!(
            target: "rts_runtime::replay",
            path = %path.display(),
            frames = frames.len(),
            "replay loaded"
        );
        Ok(Self { header, frames })
    }

    /// Sync hash after the last recorded frame.
    pub fn final_hash(&self) -> Option<SyncHash> {
        self.frames.last().map(|f| f.sync_hash)
    }

    /// Re-executes every frame on a world built from the header and checks
    /// each hash against the recording. Returns the replayed hashes.
    pub fn play(&self, ruleset: Arc<Ruleset>) -> crate::Result<Vec<SyncHash>> {
        let mut world = self.header.build_world(ruleset)?;
        self.play_on(&mut world)
    }

    /// Like [`play`](Self::play), on a world the caller already built.
    pub fn play_on(&self, world: &mut World) -> crate::Result<Vec<SyncHash>> {
        let mut hashes = Vec::with_capacity(self.frames.len());
        for recorded in &self.frames {
            let executed = execute_frame(world, recorded.frame, recorded.orders.clone());
            if executed.sync_hash != recorded.sync_hash {
                return Err(crate::RuntimeError::ReplayDiverged {
                    frame: recorded.frame,
                    expected: recorded.sync_hash,
                    got: executed.sync_hash,
                });
            }
            hashes.push(executed.sync_hash);
        }
        Ok(hashes)
    }
}
