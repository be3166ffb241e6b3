//! Orders and targeter resolution.
//!
//! Resolution picks, among every targeter offered by an actor's
//! [`IssueOrder`] traits, the highest-priority one whose `can_target` accepts.
//! Ties go to the targeter declared first: traits in registry order, then
//! each trait's targeters in the order it lists them. The chosen targeter's
//! trait builds the [`Order`], which is executed later by
//! [`World::dispatch_order`](crate::World::dispatch_order).
use std::cmp::Reverse;

use bitflags::bitflags;

use crate::capability::Capability;
use crate::store::TraitIndex;
use crate::target::Target;
use crate::types::{ActorId, CellPos, ClientId};
use crate::world::{ActorView, TraitContext, WorldView};

bitflags! {
    /// Input modifiers held while targeting.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TargetModifiers: u8 {
        const FORCE_ATTACK = 1;
        const FORCE_QUEUE = 1 << 1;
        const FORCE_MOVE = 1 << 2;
    }
}

/// An immutable instruction addressed to one actor.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Order {
    pub order_id: String,
    pub subject: ActorId,
    pub target: Target,
    pub queued: bool,
    pub extra_data: u32,
    pub target_string: Option<String>,
    pub extra_location: Option<CellPos>,
    pub client: Option<ClientId>,
}

impl Order {
    pub fn new(order_id: &str, subject: ActorId, target: Target, queued: bool) -> Self {
        Self {
            order_id: order_id.to_string(),
            subject,
            target,
            queued,
            extra_data: 0,
            target_string: None,
            extra_location: None,
            client: None,
        }
    }

    #[must_use]
    pub fn with_extra_data(mut self, extra_data: u32) -> Self {
        self.extra_data = extra_data;
        self
    }

    #[must_use]
    pub fn with_target_string(mut self, target_string: &str) -> Self {
        self.target_string = Some(target_string.to_string());
        self
    }

    #[must_use]
    pub fn with_extra_location(mut self, cell: CellPos) -> Self {
        self.extra_location = Some(cell);
        self
    }

    #[must_use]
    pub fn from_client(mut self, client: ClientId) -> Self {
        self.client = Some(client);
        self
    }
}

/// One way an actor can be ordered around; owned by an [`IssueOrder`] trait.
pub trait OrderTargeter: Send + Sync {
    fn order_id(&self) -> &str;
    fn priority(&self) -> i32;

    /// Always queue regardless of modifiers.
    fn is_queued(&self) -> bool {
        false
    }

    fn override_selection(&self) -> bool {
        true
    }

    /// `modifiers` and `cursor` are UI out-parameters: a targeter may clear a
    /// modifier it consumed or pick a cursor name.
    fn can_target(
        &self,
        actor: &ActorView<'_>,
        target: &Target,
        others_at_target: &[ActorId],
        modifiers: &mut TargetModifiers,
        cursor: &mut String,
    ) -> bool;
}

pub trait IssueOrder {
    fn orders(&self) -> Vec<&dyn OrderTargeter>;

    /// Builds the order for a resolved targeter. `None` suppresses it.
    fn issue_order(
        &self,
        actor: &ActorView<'_>,
        order_id: &str,
        target: &Target,
        queued: bool,
    ) -> Option<Order> {
        Some(Order::new(order_id, actor.id(), *target, queued))
    }
}

/// Executes orders. Returns whether the order was claimed.
pub trait ResolveOrder {
    fn resolve_order(&mut self, ctx: &mut TraitContext<'_>, order: &Order) -> bool;
}

/// World-actor hook vetoing orders before execution.
pub trait ValidateOrder {
    fn order_validation(&self, world: &WorldView<'_>, order: &Order) -> bool;
}

/// Outcome of targeter resolution, including the UI out-parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedOrder {
    pub order: Order,
    pub cursor: String,
    pub modifiers: TargetModifiers,
    pub trait_index: TraitIndex,
    pub override_selection: bool,
}

pub fn resolve_order_targeter(
    actor: &ActorView<'_>,
    target: &Target,
    others_at_target: &[ActorId],
    modifiers: TargetModifiers,
) -> Option<ResolvedOrder> {
    let mut candidates: Vec<(TraitIndex, &dyn IssueOrder, &dyn OrderTargeter)> = Vec::new();
    for (index, issuer) in actor
        .traits()
        .query(Capability::IssueOrder, |t| t.as_issue_order())
    {
        for targeter in issuer.orders() {
            candidates.push((index, issuer, targeter));
        }
    }
    candidates.sort_by_key(|(_, _, targeter)| Reverse(targeter.priority()));

    for (index, issuer, targeter) in candidates {
        let mut local = modifiers;
        let mut cursor = String::new();
        if !targeter.can_target(actor, target, others_at_target, &mut local, &mut cursor) {
            continue;
        }
        let queued = targeter.is_queued() || local.contains(TargetModifiers::FORCE_QUEUE);
        let order = issuer.issue_order(actor, targeter.order_id(), target, queued)?;
        return Some(ResolvedOrder {
            order,
            cursor,
            modifiers: local,
            trait_index: index,
            override_selection: targeter.override_selection(),
        });
    }
    None
}
