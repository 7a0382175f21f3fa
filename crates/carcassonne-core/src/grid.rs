//! Square grid coordinate system.
//!
//! This module provides the foundational coordinate types for the tile board:
//! - `Coord`: Identifies one grid cell
//! - `Side`: Identifies one of the four edges of a tile (and the direction of
//!   the neighbor across that edge)
//!
//! `y` grows going north, so the neighbor across the North edge of `(x, y)`
//! is `(x, y + 1)`.

use crate::tile::EdgeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four compass edges of a tile.
///
/// The discriminant is the edge index used everywhere in the engine:
/// North = 0, East = 1, South = 2, West = 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Side {
    /// Top edge
    North = 0,
    /// Right edge
    East = 1,
    /// Bottom edge
    South = 2,
    /// Left edge
    West = 3,
}

impl Side {
    /// All sides in clockwise order starting from North
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    /// Edge index (0..=3)
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The side facing this one on the neighboring tile
    pub const fn opposite(self) -> Side {
        Self::ALL[(self.index() + 2) % 4]
    }

    /// The side this one moves to when its tile is turned 90° clockwise
    pub const fn clockwise(self) -> Side {
        Self::ALL[(self.index() + 1) % 4]
    }

    /// Grid offset of the neighbor across this side
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Side::North => (0, 1),
            Side::East => (1, 0),
            Side::South => (0, -1),
            Side::West => (-1, 0),
        }
    }
}

impl TryFrom<u8> for Side {
    type Error = EdgeError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or(EdgeError::OutOfRange(index))
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::North => "N",
            Side::East => "E",
            Side::South => "S",
            Side::West => "W",
        };
        f.write_str(name)
    }
}

/// A grid cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Coord {
    /// Column (increases going east)
    pub x: i32,
    /// Row (increases going north)
    pub y: i32,
}

impl Coord {
    /// The cell that always holds the starting tile
    pub const ORIGIN: Coord = Coord::new(0, 0);

    /// Create a new coordinate
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell across the given side
    pub const fn neighbor(self, side: Side) -> Coord {
        let (dx, dy) = side.offset();
        Coord::new(self.x + dx, self.y + dy)
    }

    /// The four axis-adjacent cells in N, E, S, W order
    pub fn neighbors(self) -> [Coord; 4] {
        Side::ALL.map(|side| self.neighbor(side))
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_opposite_is_two_steps_around() {
        assert_eq!(Side::North.opposite(), Side::South);
        assert_eq!(Side::East.opposite(), Side::West);
        for side in Side::ALL {
            assert_eq!(side.opposite().opposite(), side);
            assert_eq!(side.clockwise().clockwise(), side.opposite());
        }
    }

    #[test]
    fn test_clockwise_cycles_in_four() {
        assert_eq!(Side::West.clockwise(), Side::North);
        for side in Side::ALL {
            let turned = side.clockwise().clockwise().clockwise().clockwise();
            assert_eq!(turned, side);
        }
    }

    #[test]
    fn test_side_from_index() {
        assert_eq!(Side::try_from(0), Ok(Side::North));
        assert_eq!(Side::try_from(3), Ok(Side::West));
        assert_eq!(Side::try_from(4), Err(EdgeError::OutOfRange(4)));
    }

    #[test]
    fn test_neighbor_offsets() {
        let c = Coord::new(2, -1);
        assert_eq!(c.neighbor(Side::North), Coord::new(2, 0));
        assert_eq!(c.neighbor(Side::East), Coord::new(3, -1));
        assert_eq!(c.neighbor(Side::South), Coord::new(2, -2));
        assert_eq!(c.neighbor(Side::West), Coord::new(1, -1));
    }

    #[test]
    fn test_neighbor_round_trip() {
        let c = Coord::new(-4, 7);
        for side in Side::ALL {
            assert_eq!(c.neighbor(side).neighbor(side.opposite()), c);
        }
        let unique: HashSet<_> = c.neighbors().into_iter().collect();
        assert_eq!(unique.len(), 4);
    }
}
