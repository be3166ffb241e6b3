//! Simulation worker that owns the authoritative [`rts_core::World`].
//!
//! Receives commands from [`RuntimeHandle`](crate::RuntimeHandle), feeds order
//! frames through the [`OrderManager`], records executed frames and publishes
//! events to the [`EventBus`].

use rts_core::{ClientId, PlayerId, RenderSnapshot, SyncHash, Tick, World};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::api::{Result, RuntimeError};
use crate::events::{Event, EventBus, FrameEvent, SessionEvent, SyncEvent};
use crate::lockstep::{FrameBatch, OrderFrame, OrderManager, SyncReport};
use crate::repository::{ReplayFrame, ReplayWriter};

/// Where the lockstep exchange currently stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameStatus {
    pub next_frame: u64,
    pub tick: Tick,
    pub sync_hash: SyncHash,
    /// Clients the next frame is waiting on.
    pub waiting_on: Vec<ClientId>,
}

/// Commands that can be sent to the simulation worker
pub enum Command {
    /// Buffer a client's frame, then execute every frame that became ready.
    SubmitFrame {
        frame: OrderFrame,
        reply: oneshot::Sender<Result<FrameBatch>>,
    },
    /// Compare a client's hash against the local simulation.
    ReportSync {
        report: SyncReport,
        reply: oneshot::Sender<Result<()>>,
    },
    AddClient {
        client: ClientId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Remove a client, then execute every frame that became ready.
    RemoveClient {
        client: ClientId,
        reply: oneshot::Sender<Result<FrameBatch>>,
    },
    /// Render projection for one viewer (read-only).
    Snapshot {
        viewer: PlayerId,
        reply: oneshot::Sender<RenderSnapshot>,
    },
    Status { reply: oneshot::Sender<FrameStatus> },
}

/// Background task that processes lockstep commands.
///
/// The world is only touched from this task, one command at a time, so the
/// simulation itself stays synchronous.
pub struct SimulationWorker {
    world: World,
    orders: OrderManager,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    replay: Option<ReplayWriter>,
}

impl SimulationWorker {
    /// Creates a new simulation worker.
    pub fn new(
        world: World,
        orders: OrderManager,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        replay: Option<ReplayWriter>,
    ) -> Self {
        info!(
            target: "rts_runtime::worker",
            clients = orders.clients().count(),
            actors = world.actor_ids().count(),
            recording = replay.is_some(),
            "simulation worker initialized"
        );

        Self {
            world,
            orders,
            command_rx,
            event_bus,
            replay,
        }
    }

    /// Main worker loop. Returns the world once every handle is dropped.
    pub async fn run(mut self) -> World {
        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }
        debug!(
            target: "rts_runtime::worker",
            next_frame = self.orders.next_frame(),
            "command channel closed, stopping"
        );
        self.world
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SubmitFrame { frame, reply } => {
                let result = self
                    .orders
                    .submit(frame)
                    .map(|()| self.execute_ready());
                if reply.send(result).is_err() {
                    debug!(target: "rts_runtime::worker", "SubmitFrame reply channel closed (caller dropped)");
                }
            }
            Command::ReportSync { report, reply } => {
                let result = self.orders.report_sync(report);
                self.publish_desync(&result);
                if reply.send(result).is_err() {
                    debug!(target: "rts_runtime::worker", "ReportSync reply channel closed (caller dropped)");
                }
            }
            Command::AddClient { client, reply } => {
                let result = self.orders.add_client(client);
                if result.is_ok() {
                    self.event_bus
                        .publish(Event::Session(SessionEvent::ClientJoined {
                            client,
                            frame: self.orders.next_frame(),
                        }));
                }
                if reply.send(result).is_err() {
                    debug!(target: "rts_runtime::worker", "AddClient reply channel closed (caller dropped)");
                }
            }
            Command::RemoveClient { client, reply } => {
                let result = self.orders.remove_client(client).map(|()| {
                    self.event_bus
                        .publish(Event::Session(SessionEvent::ClientLeft {
                            client,
                            frame: self.orders.next_frame(),
                        }));
                    self.execute_ready()
                });
                if reply.send(result).is_err() {
                    debug!(target: "rts_runtime::worker", "RemoveClient reply channel closed (caller dropped)");
                }
            }
            Command::Snapshot { viewer, reply } => {
                if reply.send(self.world.snapshot(viewer)).is_err() {
                    debug!(target: "rts_runtime::worker", "Snapshot reply channel closed (caller dropped)");
                }
            }
            Command::Status { reply } => {
                let status = FrameStatus {
                    next_frame: self.orders.next_frame(),
                    tick: self.world.current_tick(),
                    sync_hash: self.world.sync_hash(),
                    waiting_on: self.orders.missing_clients(),
                };
                if reply.send(status).is_err() {
                    debug!(target: "rts_runtime::worker", "Status reply channel closed (caller dropped)");
                }
            }
        }
    }

    /// Executes ready frames one at a time, recording and publishing each
    /// before its early sync reports are checked. A desync ends the batch.
    fn execute_ready(&mut self) -> FrameBatch {
        let mut batch = FrameBatch::default();
        while let Some(frame) = self.orders.advance(&mut self.world) {
            if let Some(replay) = self.replay.as_mut() {
                if let Err(e) = replay.append(&ReplayFrame::from(&frame)) {
                    error!(
                        target: "rts_runtime::worker",
                        frame = frame.frame,
                        error = %e,
                        "failed to record frame, replay stopped"
                    );
                    self.replay = None;
                }
            }
            for event in FrameEvent::from_executed(&frame) {
                self.event_bus.publish(Event::Frame(event));
            }

            let verified = self.orders.verify(frame.frame);
            self.publish_desync(&verified);
            batch.executed.push(frame);
            if let Err(err) = verified {
                batch.desync = Some(err);
                break;
            }
        }
        batch
    }

    fn publish_desync(&self, result: &Result<()>) {
        if let Err(RuntimeError::Desync {
            frame,
            client,
            expected,
            got,
        }) = result
        {
            self.event_bus.publish(Event::Sync(SyncEvent::Desync {
                frame: *frame,
                client: *client,
                expected: *expected,
                got: *got,
            }));
        }
    }
}
