use crate::types::{ActorId, CellPos, WorldPos};
use crate::world::{ActorView, WorldView};

/// Weak reference to something an order or weapon can aim at.
///
/// Actor targets hold only the id; they stop resolving once the actor leaves
/// the world, dies or is disposed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    #[default]
    Invalid,
    Actor(ActorId),
    Terrain(WorldPos),
}

impl Target {
    pub fn cell(cell: CellPos) -> Self {
        Self::Terrain(cell.center())
    }

    pub fn actor_id(&self) -> Option<ActorId> {
        match self {
            Self::Actor(id) => Some(*id),
            _ => None,
        }
    }

    /// The actor behind this target while it is still a legal target.
    pub fn resolve<'w>(&self, world: &WorldView<'w>) -> Option<ActorView<'w>> {
        let Self::Actor(id) = self else {
            return None;
        };
        world
            .actor(*id)
            .filter(|actor| actor.is_in_world() && !actor.is_dead())
    }

    pub fn is_valid_for(&self, world: &WorldView<'_>) -> bool {
        match self {
            Self::Invalid => false,
            Self::Terrain(_) => true,
            Self::Actor(_) => self.resolve(world).is_some(),
        }
    }

    pub fn center_position(&self, world: &WorldView<'_>) -> Option<WorldPos> {
        match self {
            Self::Invalid => None,
            Self::Terrain(pos) => Some(*pos),
            Self::Actor(_) => self.resolve(world)?.center_position(),
        }
    }
}
