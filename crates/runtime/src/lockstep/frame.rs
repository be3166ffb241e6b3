//! Net frame payloads and the deterministic frame step.

use rts_core::{ClientId, Order, OrderOutcome, SyncHash, Tick, World};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::api::{Result, RuntimeError};

/// All orders one client issued for one net frame. An empty `orders` list
/// still counts as delivering the frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFrame {
    pub frame: u64,
    pub client: ClientId,
    pub orders: Vec<Order>,
}

impl OrderFrame {
    pub fn new(frame: u64, client: ClientId, orders: Vec<Order>) -> Self {
        Self {
            frame,
            client,
            orders,
        }
    }

    /// A frame with no orders.
    pub fn empty(frame: u64, client: ClientId) -> Self {
        Self::new(frame, client, Vec::new())
    }
}

/// Sync hash a client computed after executing `frame`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub frame: u64,
    pub client: ClientId,
    pub hash: SyncHash,
}

/// Result of executing one net frame locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutedFrame {
    pub frame: u64,
    /// Orders in the order they were applied.
    pub orders: Vec<Order>,
    pub outcomes: Vec<OrderOutcome>,
    /// World tick after the frame.
    pub tick: Tick,
    pub sync_hash: SyncHash,
}

impl ExecutedFrame {
    /// Orders that were handed to the world but not handled.
    pub fn unhandled(&self) -> impl Iterator<Item = (&Order, OrderOutcome)> {
        self.orders
            .iter()
            .zip(self.outcomes.iter().copied())
            .filter(|(_, outcome)| *outcome != OrderOutcome::Handled)
    }
}

/// Frames released by one submission.
///
/// Execution stops at the first frame whose early sync reports disagree. That
/// frame is still part of `executed`; later ready frames stay buffered.
#[derive(Debug, Default)]
pub struct FrameBatch {
    pub executed: Vec<ExecutedFrame>,
    /// Always a [`RuntimeError::Desync`].
    pub desync: Option<RuntimeError>,
}

impl FrameBatch {
    pub fn is_empty(&self) -> bool {
        self.executed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.executed.len()
    }

    /// Frame numbers in execution order.
    pub fn frames(&self) -> impl Iterator<Item = u64> + '_ {
        self.executed.iter().map(|f| f.frame)
    }

    pub fn last_hash(&self) -> Option<SyncHash> {
        self.executed.last().map(|f| f.sync_hash)
    }

    /// The executed frames, or the desync if one stopped the batch.
    pub fn into_result(self) -> Result<Vec<ExecutedFrame>> {
        match self.desync {
            Some(err) => Err(err),
            None => Ok(self.executed),
        }
    }
}

/// Applies `orders` in sequence, ticks the world once and hashes the result.
///
/// This is the only place a net frame touches the world, so live games and
/// replays advance identically.
pub fn execute_frame(world: &mut World, frame: u64, orders: Vec<Order>) -> ExecutedFrame {
    let outcomes: Vec<OrderOutcome> = orders.iter().map(|o| world.dispatch_order(o)).collect();
    world.tick();
    let sync_hash = world.sync_hash();
    trace!(
        target: "rts_runtime::lockstep",
        frame,
        orders = orders.len(),
        hash = %sync_hash,
        "frame executed"
    );
    ExecutedFrame {
        frame,
        orders,
        outcomes,
        tick: world.current_tick(),
        sync_hash,
    }
}
