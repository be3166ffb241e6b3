//! Frame buffering, gating and desync detection.

use std::collections::{BTreeMap, BTreeSet};

use rts_core::{ClientId, Order, SyncHash, World};
use tracing::{debug, warn};

use super::frame::{ExecutedFrame, FrameBatch, OrderFrame, SyncReport, execute_frame};
use crate::api::{Result, RuntimeError};

/// Buffers order frames from every client and releases them to the world in
/// lockstep.
///
/// Within a frame, orders run grouped by client id (ascending) and keep the
/// order each client sent them in. A manager without clients never advances.
#[derive(Debug)]
pub struct OrderManager {
    clients: BTreeSet<ClientId>,
    next_frame: u64,
    pending: BTreeMap<u64, BTreeMap<ClientId, Vec<Order>>>,
    local_hashes: BTreeMap<u64, SyncHash>,
    reported: BTreeMap<u64, BTreeMap<ClientId, SyncHash>>,
    hash_history: u64,
}

impl OrderManager {
    /// Net frames are numbered from one.
    pub const FIRST_FRAME: u64 = 1;
    /// Executed frames whose hashes are kept for late sync reports.
    pub const DEFAULT_HASH_HISTORY: u64 = 64;

    pub fn new(clients: impl IntoIterator<Item = ClientId>) -> Self {
        Self {
            clients: clients.into_iter().collect(),
            next_frame: Self::FIRST_FRAME,
            pending: BTreeMap::new(),
            local_hashes: BTreeMap::new(),
            reported: BTreeMap::new(),
            hash_history: Self::DEFAULT_HASH_HISTORY,
        }
    }

    pub fn with_hash_history(mut self, frames: u64) -> Self {
        self.hash_history = frames.max(1);
        self
    }

    pub fn clients(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.clients.iter().copied()
    }

    /// The frame that executes next.
    pub fn next_frame(&self) -> u64 {
        self.next_frame
    }

    /// Registers a client. It must deliver every frame from
    /// [`next_frame`](Self::next_frame) on.
    pub fn add_client(&mut self, client: ClientId) -> Result<()> {
        if !self.clients.insert(client) {
            return Err(RuntimeError::DuplicateClient(client));
        }
        debug!(target: "rts_runtime::lockstep", client, frame = self.next_frame, "client joined");
        Ok(())
    }

    /// Stops waiting for `client`. Orders it already delivered still run.
    pub fn remove_client(&mut self, client: ClientId) -> Result<()> {
        if !self.clients.remove(&client) {
            return Err(RuntimeError::UnknownClient(client));
        }
        for reports in self.reported.values_mut() {
            reports.remove(&client);
        }
        debug!(target: "rts_runtime::lockstep", client, frame = self.next_frame, "client left");
        Ok(())
    }

    /// Buffers one client's orders for one frame. Every order is stamped
    /// with the sending client.
    pub fn submit(&mut self, frame: OrderFrame) -> Result<()> {
        let OrderFrame {
            frame,
            client,
            mut orders,
        } = frame;

        if !self.clients.contains(&client) {
            return Err(RuntimeError::UnknownClient(client));
        }
        if frame < self.next_frame {
            return Err(RuntimeError::StaleFrame {
                frame,
                client,
                next: self.next_frame,
            });
        }

        let slot = self.pending.entry(frame).or_default();
        if slot.contains_key(&client) {
            return Err(RuntimeError::DuplicateFrame { frame, client });
        }
        for order in &mut orders {
            order.client = Some(client);
        }
        slot.insert(client, orders);
        Ok(())
    }

    /// True when every registered client has delivered the next frame.
    pub fn is_ready(&self) -> bool {
        !self.clients.is_empty() && self.missing_clients().is_empty()
    }

    /// Clients the next frame is still waiting on.
    pub fn missing_clients(&self) -> Vec<ClientId> {
        let delivered = self.pending.get(&self.next_frame);
        self.clients
            .iter()
            .copied()
            .filter(|c| delivered.is_none_or(|d| !d.contains_key(c)))
            .collect()
    }

    /// Executes the next frame if it is ready.
    ///
    /// Hashes clients reported ahead of time are checked by
    /// [`verify`](Self::verify), not here.
    pub fn advance(&mut self, world: &mut World) -> Option<ExecutedFrame> {
        if !self.is_ready() {
            return None;
        }

        let frame = self.next_frame;
        let orders: Vec<Order> = self
            .pending
            .remove(&frame)
            .unwrap_or_default()
            .into_values()
            .flatten()
            .collect();

        let executed = execute_frame(world, frame, orders);
        self.next_frame += 1;
        self.local_hashes.insert(frame, executed.sync_hash);
        self.trim_history();
        Some(executed)
    }

    /// Checks the hashes clients reported for `frame` before it executed.
    ///
    /// Returns [`RuntimeError::Desync`] on the first mismatch.
    pub fn verify(&mut self, frame: u64) -> Result<()> {
        let reports = self.reported.remove(&frame).unwrap_or_default();
        for (client, got) in reports {
            self.check(frame, client, got)?;
        }
        Ok(())
    }

    /// Executes and verifies frames for as long as they are ready, stopping
    /// after the first desync.
    pub fn advance_ready(&mut self, world: &mut World) -> FrameBatch {
        let mut batch = FrameBatch::default();
        while let Some(frame) = self.advance(world) {
            let verified = self.verify(frame.frame);
            batch.executed.push(frame);
            if let Err(err) = verified {
                batch.desync = Some(err);
                break;
            }
        }
        batch
    }

    /// Records a client's hash for a frame. Reports for executed frames are
    /// checked right away; the rest are checked when the frame executes.
    /// Reports older than the kept history are ignored, and reports more
    /// than the history length ahead of the next frame are refused.
    pub fn report_sync(&mut self, report: SyncReport) -> Result<()> {
        let SyncReport {
            frame,
            client,
            hash,
        } = report;

        if !self.clients.contains(&client) {
            return Err(RuntimeError::UnknownClient(client));
        }
        if frame >= self.next_frame.saturating_add(self.hash_history) {
            return Err(RuntimeError::SyncReportTooEarly {
                frame,
                client,
                next: self.next_frame,
                window: self.hash_history,
            });
        }
        if frame >= self.next_frame {
            self.reported.entry(frame).or_default().insert(client, hash);
            return Ok(());
        }
        if self.local_hashes.contains_key(&frame) {
            return self.check(frame, client, hash);
        }
        debug!(target: "rts_runtime::lockstep", frame, client, "sync report outside hash history");
        Ok(())
    }

    /// Hash of an executed frame still inside the history window.
    pub fn local_hash(&self, frame: u64) -> Option<SyncHash> {
        self.local_hashes.get(&frame).copied()
    }

    fn check(&self, frame: u64, client: ClientId, got: SyncHash) -> Result<()> {
        let Some(&expected) = self.local_hashes.get(&frame) else {
            return Ok(());
        };
        if expected != got {
            warn!(
                target: "rts_runtime::lockstep",
                frame,
                client,
                expected = %expected,
                got = %got,
                "desync detected"
            );
            return Err(RuntimeError::Desync {
                frame,
                client,
                expected,
                got,
            });
        }
        Ok(())
    }

    fn trim_history(&mut self) {
        let keep_from = self.next_frame.saturating_sub(self.hash_history);
        self.local_hashes = self.local_hashes.split_off(&keep_from);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rts_content::MobileInfo;
    use rts_core::{
        ActorId, ActorTemplate, CellPos, InitValues, OrderOutcome, PlayerId, Players, Ruleset,
        SimConfig, SyncHash, Target,
    };

    use super::*;

    fn world() -> (World, ActorId) {
        let ruleset = Ruleset::new()
            .with(ActorTemplate::new("rifle").with(MobileInfo::default()))
            .unwrap();
        let mut players = Players::new();
        players.add("Alice", "multi0").unwrap();
        let mut world = World::new(Arc::new(ruleset), players, SimConfig::default(), 1).unwrap();
        let init = InitValues::new().with(rts_content::LOCATION_INIT, CellPos::ORIGIN);
        let rifle = world.spawn("rifle", PlayerId(1), &init).unwrap();
        (world, rifle)
    }

    fn move_to(subject: ActorId, x: i32) -> Order {
        Order::new(MobileInfo::MOVE_ORDER, subject, Target::cell(CellPos::new(x, 0)), false)
    }

    #[test]
    fn frames_wait_for_every_client() {
        let (mut world, rifle) = world();
        let mut manager = OrderManager::new([1, 2]);

        manager
            .submit(OrderFrame::new(1, 2, vec![move_to(rifle, 5)]))
            .unwrap();
        assert_eq!(manager.missing_clients(), vec![1]);
        assert!(manager.advance(&mut world).is_none());
        assert_eq!(world.current_tick().0, 0);

        manager.submit(OrderFrame::empty(1, 1)).unwrap();
        let executed = manager.advance(&mut world).unwrap();
        assert_eq!(executed.frame, 1);
        assert_eq!(executed.orders[0].client, Some(2));
        assert_eq!(executed.outcomes, vec![OrderOutcome::Handled]);
        assert_eq!(manager.next_frame(), 2);
        assert_eq!(world.current_tick().0, 1);
    }

    #[test]
    fn orders_run_by_client_then_arrival() {
        let (mut world, rifle) = world();
        let mut manager = OrderManager::new([1, 2]);

        let late = move_to(rifle, 9);
        let first = move_to(rifle, 3);
        let second = Order::new(MobileInfo::STOP_ORDER, rifle, Target::Invalid, false);
        manager.submit(OrderFrame::new(1, 2, vec![late])).unwrap();
        manager
            .submit(OrderFrame::new(1, 1, vec![first, second]))
            .unwrap();

        let executed = manager.advance(&mut world).unwrap();
        let sequence: Vec<_> = executed
            .orders
            .iter()
            .map(|o| (o.client, o.order_id.as_str()))
            .collect();
        assert_eq!(
            sequence,
            [(Some(1), "Move"), (Some(1), "Stop"), (Some(2), "Move")]
        );
    }

    #[test]
    fn buffered_frames_execute_in_sequence() {
        let (mut world, _) = world();
        let mut manager = OrderManager::new([1]);
        manager.submit(OrderFrame::empty(2, 1)).unwrap();
        assert!(manager.advance_ready(&mut world).is_empty());

        manager.submit(OrderFrame::empty(1, 1)).unwrap();
        let batch = manager.advance_ready(&mut world);
        assert!(batch.desync.is_none());
        assert_eq!(batch.frames().collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn submission_errors() {
        let (mut world, _) = world();
        let mut manager = OrderManager::new([1]);
        assert!(matches!(
            manager.submit(OrderFrame::empty(1, 7)),
            Err(RuntimeError::UnknownClient(7))
        ));
        manager.submit(OrderFrame::empty(1, 1)).unwrap();
        assert!(matches!(
            manager.submit(OrderFrame::empty(1, 1)),
            Err(RuntimeError::DuplicateFrame { frame: 1, client: 1 })
        ));
        manager.advance(&mut world).unwrap();
        assert!(matches!(
            manager.submit(OrderFrame::empty(1, 1)),
            Err(RuntimeError::StaleFrame { next: 2, .. })
        ));
    }

    #[test]
    fn matching_hashes_pass_and_mismatches_desync() {
        let (mut world, _) = world();
        let mut manager = OrderManager::new([1, 2]);
        manager.submit(OrderFrame::empty(1, 1)).unwrap();
        manager.submit(OrderFrame::empty(1, 2)).unwrap();
        let executed = manager.advance(&mut world).unwrap();

        let ok = SyncReport {
            frame: 1,
            client: 2,
            hash: executed.sync_hash,
        };
        manager.report_sync(ok).unwrap();

        let bad = SyncReport {
            hash: SyncHash([0; 32]),
            ..ok
        };
        let err = manager.report_sync(bad).unwrap_err();
        assert!(err.is_desync());
        assert!(matches!(err, RuntimeError::Desync { frame: 1, client: 2, .. }));
    }

    #[test]
    fn early_reports_are_checked_on_execution() {
        let (mut world, _) = world();
        let mut manager = OrderManager::new([1]);
        manager
            .report_sync(SyncReport {
                frame: 1,
                client: 1,
                hash: SyncHash([0; 32]),
            })
            .unwrap();
        manager.submit(OrderFrame::empty(1, 1)).unwrap();
        assert!(manager.advance(&mut world).is_some());
        assert!(manager.verify(1).unwrap_err().is_desync());
        assert_eq!(manager.next_frame(), 2);
    }

    #[test]
    fn leaving_clients_stop_gating() {
        let (mut world, _) = world();
        let mut manager = OrderManager::new([1, 2]);
        manager.submit(OrderFrame::empty(1, 1)).unwrap();
        assert!(!manager.is_ready());
        manager.remove_client(2).unwrap();
        assert!(manager.advance(&mut world).is_some());

        assert!(manager.add_client(1).is_err());
        manager.add_client(3).unwrap();
        manager.submit(OrderFrame::empty(2, 1)).unwrap();
        assert_eq!(manager.missing_clients(), vec![3]);
    }

    #[test]
    fn old_hashes_fall_out_of_history() {
        let (mut world, _) = world();
        let mut manager = OrderManager::new([1]).with_hash_history(2);
        for frame in 1..=4 {
            manager.submit(OrderFrame::empty(frame, 1)).unwrap();
        }
        assert_eq!(manager.advance_ready(&mut world).len(), 4);
        assert!(manager.local_hash(1).is_none());
        assert!(manager.local_hash(4).is_some());
        manager
            .report_sync(SyncReport {
                frame: 1,
                client: 1,
                hash: SyncHash([0; 32]),
            })
            .unwrap();
    }

    #[test]
    fn no_clients_means_no_progress() {
        let (mut world, _) = world();
        let mut manager = OrderManager::new([]);
        assert!(manager.advance_ready(&mut world).is_empty());
    }

    #[test]
    fn desync_mid_batch_keeps_the_frames_already_run() {
        let (mut world, _) = world();
        let mut manager = OrderManager::new([1]);
        for frame in 1..=3 {
            manager.submit(OrderFrame::empty(frame, 1)).unwrap();
        }
        manager
            .report_sync(SyncReport {
                frame: 2,
                client: 1,
                hash: SyncHash([0; 32]),
            })
            .unwrap();

        let batch = manager.advance_ready(&mut world);
        assert_eq!(batch.frames().collect::<Vec<_>>(), [1, 2]);
        assert!(matches!(
            batch.desync,
            Some(RuntimeError::Desync { frame: 2, client: 1, .. })
        ));
        assert_eq!(manager.next_frame(), 3);

        let rest = manager.advance_ready(&mut world);
        assert_eq!(rest.frames().collect::<Vec<_>>(), [3]);
        assert!(rest.into_result().is_ok());
    }

    #[test]
    fn reports_far_ahead_are_refused() {
        let mut manager = OrderManager::new([1]).with_hash_history(4);
        let report = |frame| SyncReport {
            frame,
            client: 1,
            hash: SyncHash([0; 32]),
        };
        manager.report_sync(report(4)).unwrap();
        assert!(matches!(
            manager.report_sync(report(5)),
            Err(RuntimeError::SyncReportTooEarly { frame: 5, next: 1, window: 4, .. })
        ));
        assert!(manager.report_sync(report(u64::MAX)).is_err());
    }
}
