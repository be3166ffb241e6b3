//! Identifiers and integer coordinate types shared by every simulation module.
//!
//! Nothing in here uses floating point: all positions are expressed in world
//! units (1024 per cell) so that every replica computes identical results.
use std::fmt;

/// World units per cell edge.
pub const CELL_SIZE: i32 = 1024;

/// Unique identifier of an actor. Identifiers are handed out monotonically
/// and never reused, even when assembly fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a player slot in the [`Players`](crate::Players) table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// The neutral player that owns the world actor and ownerless actors.
    pub const NEUTRAL: Self = Self(0);
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Identifier of a network client as seen by the order transport.
pub type ClientId = u32;

/// Discrete simulation step counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Self = Self(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Grid cell coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
}

impl CellPos {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World position of the cell center at ground level.
    pub fn center(self) -> WorldPos {
        WorldPos::new(
            self.x * CELL_SIZE + CELL_SIZE / 2,
            self.y * CELL_SIZE + CELL_SIZE / 2,
            0,
        )
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Absolute position in world units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl WorldPos {
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Cell containing this position (ignores height).
    pub fn cell(self) -> CellPos {
        CellPos::new(self.x.div_euclid(CELL_SIZE), self.y.div_euclid(CELL_SIZE))
    }
}

impl std::ops::Add<WorldVec> for WorldPos {
    type Output = WorldPos;
    fn add(self, rhs: WorldVec) -> WorldPos {
        WorldPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for WorldPos {
    type Output = WorldVec;
    fn sub(self, rhs: WorldPos) -> WorldVec {
        WorldVec::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Relative offset in world units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldVec {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl WorldVec {
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn length_squared(self) -> i64 {
        let (x, y, z) = (self.x as i64, self.y as i64, self.z as i64);
        x * x + y * y + z * z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_center_round_trips_through_world_position() {
        let cell = CellPos::new(3, -2);
        assert_eq!(cell.center().cell(), cell);
    }

    #[test]
    fn position_difference_is_a_vector() {
        let a = WorldPos::new(10, 20, 0);
        let b = WorldPos::new(13, 24, 0);
        assert_eq!((b - a).length_squared(), 25);
    }
}
