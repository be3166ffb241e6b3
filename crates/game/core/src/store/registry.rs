use strum::EnumCount;

use crate::capability::Capability;
use crate::store::TraitIndex;

/// Per-actor implementer lists, one per capability, in declaration order.
///
/// Built eagerly during assembly and never modified afterwards.
#[derive(Clone, Debug)]
pub struct CapabilityRegistry {
    implementers: [Vec<TraitIndex>; Capability::COUNT],
}

impl CapabilityRegistry {
    pub(crate) fn new() -> Self {
        Self {
            implementers: std::array::from_fn(|_| Vec::new()),
        }
    }

    pub(crate) fn insert(&mut self, capability: Capability, index: TraitIndex) {
        self.implementers[capability.index()].push(index);
    }

    pub fn implementers(&self, capability: Capability) -> &[TraitIndex] {
        &self.implementers[capability.index()]
    }

    pub fn first(&self, capability: Capability) -> Option<TraitIndex> {
        self.implementers(capability).first().copied()
    }
}
