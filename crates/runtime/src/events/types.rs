//! Typed runtime events.

use rts_core::{ActorId, ClientId, SyncHash, Tick};
use serde::{Deserialize, Serialize};

use crate::lockstep::ExecutedFrame;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameEvent {
    /// A net frame ran and the world ticked once.
    Executed {
        frame: u64,
        tick: Tick,
        sync_hash: SyncHash,
        orders: usize,
    },
    /// An order nobody handled, or one the world rejected.
    OrderDropped {
        frame: u64,
        order_id: String,
        subject: ActorId,
        client: Option<ClientId>,
    },
}

impl FrameEvent {
    /// The `Executed` event followed by one `OrderDropped` per unhandled
    /// order.
    pub fn from_executed(executed: &ExecutedFrame) -> Vec<FrameEvent> {
        let mut events = vec![FrameEvent::Executed {
            frame: executed.frame,
            tick: executed.tick,
            sync_hash: executed.sync_hash,
            orders: executed.orders.len(),
        }];
        events.extend(
            executed
                .unhandled()
                .map(|(order, _)| FrameEvent::OrderDropped {
                    frame: executed.frame,
                    order_id: order.order_id.clone(),
                    subject: order.subject,
                    client: order.client,
                }),
        );
        events
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncEvent {
    Desync {
        frame: u64,
        client: ClientId,
        expected: SyncHash,
        got: SyncHash,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    ClientJoined { client: ClientId, frame: u64 },
    ClientLeft { client: ClientId, frame: u64 },
}
