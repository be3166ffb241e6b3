//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! submitting frames, reporting hashes or streaming events from specific
//! topics.
use std::collections::HashMap;

use rts_core::{ClientId, Order, PlayerId, RenderSnapshot};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::lockstep::{FrameBatch, OrderFrame, SyncReport};
use crate::workers::{Command, FrameStatus};

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Submit one client's orders for a frame.
    ///
    /// Returns the frames this submission released, which is empty while
    /// other clients are still missing. A desync found while executing them
    /// is carried in [`FrameBatch::desync`] next to the frames that ran.
    pub async fn submit_frame(&self, frame: OrderFrame) -> Result<FrameBatch> {
        self.request(|reply| Command::SubmitFrame { frame, reply })
            .await?
    }

    /// Shorthand for [`submit_frame`](Self::submit_frame).
    pub async fn submit_orders(
        &self,
        frame: u64,
        client: ClientId,
        orders: Vec<Order>,
    ) -> Result<FrameBatch> {
        self.submit_frame(OrderFrame::new(frame, client, orders))
            .await
    }

    /// Report the hash a client computed for a frame.
    ///
    /// Fails with [`RuntimeError::Desync`] if it differs from the local one.
    pub async fn report_sync(&self, report: SyncReport) -> Result<()> {
        self.request(|reply| Command::ReportSync { report, reply })
            .await?
    }

    pub async fn add_client(&self, client: ClientId) -> Result<()> {
        self.request(|reply| Command::AddClient { client, reply })
            .await?
    }

    /// Remove a client. Frames that were only waiting on it execute.
    pub async fn remove_client(&self, client: ClientId) -> Result<FrameBatch> {
        self.request(|reply| Command::RemoveClient { client, reply })
            .await?
    }

    /// Query what `viewer` can currently see (read-only snapshot)
    pub async fn snapshot(&self, viewer: PlayerId) -> Result<RenderSnapshot> {
        self.request(|reply| Command::Snapshot { viewer, reply })
            .await
    }

    pub async fn status(&self) -> Result<FrameStatus> {
        self.request(|reply| Command::Status { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Frame` - Executed frames and dropped orders
    /// - `Topic::Sync` - Desync reports
    /// - `Topic::Session` - Clients joining and leaving
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use rts_runtime::Topic;
    ///
    /// let mut frames = handle.subscribe(Topic::Frame);
    /// while let Ok(event) = frames.recv().await {
    ///     // Handle frame events
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    ///
    /// Returns a map of topic to receiver for each requested topic.
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
