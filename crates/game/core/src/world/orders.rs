use tracing::{debug, trace};

use crate::capability::Capability;
use crate::order::{Order, ResolvedOrder, TargetModifiers, resolve_order_targeter};
use crate::target::Target;
use crate::types::ActorId;
use crate::world::World;

/// What happened to an order handed to [`World::dispatch_order`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderOutcome {
    /// At least one `ResolveOrder` implementer claimed it.
    Handled,
    /// Nobody matched the order id.
    Unclaimed,
    /// A world-actor `ValidateOrder` hook vetoed it.
    Rejected,
    /// The subject is gone or out of the world.
    SubjectMissing,
}

impl World {
    /// Picks the order `subject` would issue against `target`.
    pub fn resolve_order(
        &self,
        subject: ActorId,
        target: &Target,
        modifiers: TargetModifiers,
    ) -> Option<ResolvedOrder> {
        let view = self.view();
        let actor = view.actor(subject).filter(|a| a.is_in_world())?;
        let others: Vec<ActorId> = match target {
            Target::Actor(id) => view
                .actor(*id)
                .and_then(|a| a.location())
                .map(|cell| view.actors_at(cell).to_vec())
                .unwrap_or_default(),
            Target::Terrain(pos) => view.actors_at(pos.cell()).to_vec(),
            Target::Invalid => Vec::new(),
        };
        resolve_order_targeter(&actor, target, &others, modifiers)
    }

    /// Every `ValidateOrder` implementer on the world actor must accept.
    pub fn validate_order(&self, order: &Order) -> bool {
        let view = self.view();
        let Some(world_actor) = view.world_actor() else {
            return true;
        };
        world_actor
            .traits()
            .query(Capability::ValidateOrder, |t| t.as_validate_order())
            .all(|(_, validator)| validator.order_validation(&view, order))
    }

    /// Validates `order`, then offers it to every `ResolveOrder` implementer
    /// on the subject in registry order. Each implementer matches on the
    /// order id; an unclaimed order is ignored.
    pub fn dispatch_order(&mut self, order: &Order) -> OrderOutcome {
        if !self.is_in_world(order.subject) {
            trace!(
                target: "rts_core::orders",
                order = order.order_id.as_str(),
                subject = %order.subject,
                "order subject missing"
            );
            return OrderOutcome::SubjectMissing;
        }
        if !self.validate_order(order) {
            debug!(
                target: "rts_core::orders",
                order = order.order_id.as_str(),
                subject = %order.subject,
                "order rejected by validation"
            );
            return OrderOutcome::Rejected;
        }

        let mut claimed = false;
        self.fan_out(order.subject, Capability::ResolveOrder, |t, ctx| {
            if let Some(r) = t.as_resolve_order_mut() {
                claimed |= r.resolve_order(ctx, order);
            }
        });

        if claimed {
            trace!(
                target: "rts_core::orders",
                order = order.order_id.as_str(),
                subject = %order.subject,
                queued = order.queued,
                "order handled"
            );
            OrderOutcome::Handled
        } else {
            trace!(
                target: "rts_core::orders",
                order = order.order_id.as_str(),
                subject = %order.subject,
                "order unclaimed"
            );
            OrderOutcome::Unclaimed
        }
    }
}
