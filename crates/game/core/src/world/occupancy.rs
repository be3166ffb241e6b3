use std::collections::BTreeMap;

use crate::types::{ActorId, CellPos};

/// Cell occupancy index for in-world actors that occupy space.
#[derive(Clone, Debug, Default)]
pub struct Occupancy {
    cells: BTreeMap<CellPos, Vec<ActorId>>,
    by_actor: BTreeMap<ActorId, Vec<CellPos>>,
}

impl Occupancy {
    pub(crate) fn add(&mut self, actor: ActorId, cells: Vec<CellPos>) {
        self.remove(actor);
        for cell in &cells {
            self.cells.entry(*cell).or_default().push(actor);
        }
        if !cells.is_empty() {
            self.by_actor.insert(actor, cells);
        }
    }

    pub(crate) fn remove(&mut self, actor: ActorId) {
        let Some(cells) = self.by_actor.remove(&actor) else {
            return;
        };
        for cell in cells {
            if let Some(occupants) = self.cells.get_mut(&cell) {
                occupants.retain(|id| *id != actor);
                if occupants.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
    }

    /// Occupants of `cell` in the order they entered it.
    pub fn at(&self, cell: CellPos) -> &[ActorId] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cells_of(&self, actor: ActorId) -> &[CellPos] {
        self.by_actor
            .get(&actor)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_occupied(&self, cell: CellPos) -> bool {
        self.cells.contains_key(&cell)
    }
}
