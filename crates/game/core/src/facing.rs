//! Body orientation.
//!
//! Facings are 8-bit compass steps (0..256), counter-clockwise from north.
use crate::capability::{ActorTrait, Capability};
use crate::error::AssemblyError;
use crate::store::{ActorInitializer, TraitInfo};
use crate::sync::{SyncHasher, SyncState};

pub const FACING_STEPS: i32 = 256;

pub trait Facing {
    fn facing(&self) -> i32;
    /// Turn rate in facing steps per tick.
    fn turn_speed(&self) -> i32;
    fn set_facing(&mut self, facing: i32);
}

/// Steps `current` toward `desired` by at most `turn_speed`, along the
/// shorter arc.
pub fn tick_facing(current: i32, desired: i32, turn_speed: i32) -> i32 {
    let current = current.rem_euclid(FACING_STEPS);
    let desired = desired.rem_euclid(FACING_STEPS);
    let left = (desired - current).rem_euclid(FACING_STEPS);
    let right = (current - desired).rem_euclid(FACING_STEPS);
    let step = turn_speed.max(0);
    if left <= right {
        if left <= step {
            desired
        } else {
            (current + step).rem_euclid(FACING_STEPS)
        }
    } else if right <= step {
        desired
    } else {
        (current - step).rem_euclid(FACING_STEPS)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FacingInfo {
    pub initial_facing: i32,
    pub turn_speed: i32,
}

impl FacingInfo {
    /// Initializer overriding the starting facing.
    pub const INIT_KEY: &'static str = "facing";
}

impl Default for FacingInfo {
    fn default() -> Self {
        Self {
            initial_facing: 0,
            turn_speed: 8,
        }
    }
}

impl TraitInfo for FacingInfo {
    fn kind(&self) -> &'static str {
        "Facing"
    }

    fn provides(&self) -> &[Capability] {
        &[Capability::Facing, Capability::SyncState]
    }

    fn uses_inits(&self) -> &[&'static str] {
        &[Self::INIT_KEY]
    }

    fn create(&self, init: &ActorInitializer<'_>) -> Result<Box<dyn ActorTrait>, AssemblyError> {
        let facing = init
            .get_or(Self::INIT_KEY, self.initial_facing)?
            .rem_euclid(FACING_STEPS);
        Ok(Box::new(FacingTrait {
            facing,
            turn_speed: self.turn_speed,
        }))
    }
}

#[derive(Debug)]
pub struct FacingTrait {
    facing: i32,
    turn_speed: i32,
}

impl Facing for FacingTrait {
    fn facing(&self) -> i32 {
        self.facing
    }

    fn turn_speed(&self) -> i32 {
        self.turn_speed
    }

    fn set_facing(&mut self, facing: i32) {
        self.facing = facing.rem_euclid(FACING_STEPS);
    }
}

impl SyncState for FacingTrait {
    fn sync_state(&self, hasher: &mut SyncHasher) {
        hasher.write_i32(self.facing);
    }
}

impl ActorTrait for FacingTrait {
    fn as_facing(&self) -> Option<&dyn Facing> {
        Some(self)
    }

    fn as_facing_mut(&mut self) -> Option<&mut dyn Facing> {
        Some(self)
    }

    fn as_sync_state(&self) -> Option<&dyn SyncState> {
        Some(self)
    }
}
