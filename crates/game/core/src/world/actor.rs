use std::collections::VecDeque;
use std::sync::Arc;

use crate::activity::Activity;
use crate::lifecycle::Lifecycle;
use crate::store::{ActorTemplate, TraitStore};
use crate::types::{ActorId, PlayerId};

/// An entity owned by the world. Only the world moves it through its
/// lifecycle; traits reach other actors through targets and effects.
#[derive(Debug)]
pub struct Actor {
    pub(crate) id: ActorId,
    pub(crate) template: Arc<ActorTemplate>,
    pub(crate) owner: PlayerId,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) store: TraitStore,
    pub(crate) activities: VecDeque<Box<dyn Activity>>,
    /// Set while the front activity is detached for its tick.
    pub(crate) activity_in_flight: bool,
    pub(crate) disposing: bool,
}

impl Actor {
    pub(crate) fn new(
        id: ActorId,
        template: Arc<ActorTemplate>,
        owner: PlayerId,
        store: TraitStore,
    ) -> Self {
        Self {
            id,
            template,
            owner,
            lifecycle: Lifecycle::Constructed,
            store,
            activities: VecDeque::new(),
            activity_in_flight: false,
            disposing: false,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn template(&self) -> &ActorTemplate {
        &self.template
    }

    pub fn traits(&self) -> &TraitStore {
        &self.store
    }

    pub fn is_idle(&self) -> bool {
        self.activities.is_empty() && !self.activity_in_flight
    }

    pub fn activity_names(&self) -> Vec<&str> {
        self.activities.iter().map(|a| a.name()).collect()
    }
}
