//! Tile descriptions: edge features and internal connectivity.
//!
//! A `Tile` knows what sits on each of its four edges and how those edges are
//! joined inside the tile:
//! - Roads either pass straight through (exactly two road edges) or run into
//!   a central crossroads
//! - City edges may be joined into one city across the tile
//!
//! Tiles are immutable once built. Rotation produces a new tile.

use crate::grid::Side;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// What occupies one edge of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeFeature {
    /// Open field
    #[serde(rename = "grass")]
    Grass,
    /// City wall segment
    #[serde(rename = "city")]
    City,
    /// Field crossed by a road
    #[serde(rename = "grass+road")]
    Road,
}

impl fmt::Display for EdgeFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeFeature::Grass => "grass",
            EdgeFeature::City => "city",
            EdgeFeature::Road => "grass+road",
        };
        f.write_str(name)
    }
}

/// Errors raised while building a tile
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileError {
    #[error("crossroads edge {0} has no road")]
    CrossroadsWithoutRoad(Side),

    #[error("connected city edge {0} has no city")]
    ConnectedCityWithoutCity(Side),

    #[error("tile has {count} road edges outside its crossroads, expected 0 or 2")]
    UnpairedRoad { count: usize },
}

/// Errors raised when asking a tile about one of its edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EdgeError {
    #[error("edge index {0} is out of range 0..=3")]
    OutOfRange(u8),

    #[error("edge {0} has no road")]
    NoRoad(Side),
}

/// A set of sides stored as a 4-bit mask (bit `i` = side with index `i`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Side>", into = "Vec<Side>")]
pub struct SideSet(u8);

impl SideSet {
    const MASK: u8 = 0b1111;

    /// The empty set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// All four sides
    pub const fn all() -> Self {
        Self(Self::MASK)
    }

    /// Build a set in const context
    pub const fn of(sides: &[Side]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < sides.len() {
            bits |= 1 << sides[i] as u8;
            i += 1;
        }
        Self(bits)
    }

    pub const fn contains(self, side: Side) -> bool {
        self.0 & (1 << side as u8) != 0
    }

    pub fn insert(&mut self, side: Side) {
        self.0 |= 1 << side as u8;
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in edge-index order
    pub fn iter(self) -> impl Iterator<Item = Side> {
        Side::ALL.into_iter().filter(move |&side| self.contains(side))
    }

    /// Map every member through `Side::clockwise`
    pub const fn rotate_clockwise(self) -> Self {
        Self(((self.0 << 1) | (self.0 >> 3)) & Self::MASK)
    }
}

impl FromIterator<Side> for SideSet {
    fn from_iter<I: IntoIterator<Item = Side>>(iter: I) -> Self {
        let mut set = SideSet::empty();
        for side in iter {
            set.insert(side);
        }
        set
    }
}

impl<const N: usize> From<[Side; N]> for SideSet {
    fn from(sides: [Side; N]) -> Self {
        sides.into_iter().collect()
    }
}

impl From<Vec<Side>> for SideSet {
    fn from(sides: Vec<Side>) -> Self {
        sides.into_iter().collect()
    }
}

impl From<SideSet> for Vec<Side> {
    fn from(set: SideSet) -> Self {
        set.iter().collect()
    }
}

/// Serialized shape of a tile. Deserializing a `Tile` goes through this and
/// re-runs construction checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileSpec {
    /// Features in N, E, S, W order
    pub edges: [EdgeFeature; 4],
    #[serde(default, skip_serializing_if = "SideSet::is_empty")]
    pub crossroads: SideSet,
    #[serde(default, skip_serializing_if = "SideSet::is_empty")]
    pub connected_cities: SideSet,
}

/// One game tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TileSpec", into = "TileSpec")]
pub struct Tile {
    edges: [EdgeFeature; 4],
    crossroads: SideSet,
    connected_cities: SideSet,
}

impl Tile {
    /// Create a tile without a crossroads
    pub fn new(
        north: EdgeFeature,
        east: EdgeFeature,
        south: EdgeFeature,
        west: EdgeFeature,
    ) -> Result<Self, TileError> {
        Self::with_crossroads(north, east, south, west, SideSet::empty())
    }

    /// Create a tile whose `crossroads` edges meet at a central junction
    pub fn with_crossroads(
        north: EdgeFeature,
        east: EdgeFeature,
        south: EdgeFeature,
        west: EdgeFeature,
        crossroads: SideSet,
    ) -> Result<Self, TileError> {
        Self {
            edges: [north, east, south, west],
            crossroads,
            connected_cities: SideSet::empty(),
        }
        .validated()
    }

    /// Record which city edges are joined through the tile's interior
    pub fn with_connected_cities(self, cities: SideSet) -> Result<Self, TileError> {
        Self {
            connected_cities: cities,
            ..self
        }
        .validated()
    }

    /// Assemble a tile without checks. Only for catalog data covered by tests.
    pub(crate) const fn from_parts(
        edges: [EdgeFeature; 4],
        crossroads: SideSet,
        connected_cities: SideSet,
    ) -> Self {
        Self {
            edges,
            crossroads,
            connected_cities,
        }
    }

    fn validated(self) -> Result<Self, TileError> {
        if let Some(side) = self.crossroads.iter().find(|&s| !self.edge_has_road(s)) {
            return Err(TileError::CrossroadsWithoutRoad(side));
        }
        if let Some(side) = self
            .connected_cities
            .iter()
            .find(|&s| !self.edge_has_city(s))
        {
            return Err(TileError::ConnectedCityWithoutCity(side));
        }
        // A road that does not end in the crossroads needs exactly one partner
        let count = self.through_roads().count();
        if count != 0 && count != 2 {
            return Err(TileError::UnpairedRoad { count });
        }
        Ok(self)
    }

    /// Road edges that pass straight through rather than into the crossroads
    fn through_roads(&self) -> impl Iterator<Item = Side> + '_ {
        Side::ALL
            .into_iter()
            .filter(|&s| self.edge_has_road(s) && !self.crossroads.contains(s))
    }

    /// Feature on the given edge
    pub fn edge(&self, side: Side) -> EdgeFeature {
        self.edges[side.index()]
    }

    /// Feature at a raw edge index
    pub fn edge_at(&self, index: u8) -> Result<EdgeFeature, EdgeError> {
        Side::try_from(index).map(|side| self.edge(side))
    }

    /// Features in N, E, S, W order
    pub fn edges(&self) -> [EdgeFeature; 4] {
        self.edges
    }

    pub fn edge_has_road(&self, side: Side) -> bool {
        self.edge(side) == EdgeFeature::Road
    }

    pub fn edge_has_city(&self, side: Side) -> bool {
        self.edge(side) == EdgeFeature::City
    }

    pub fn has_crossroads(&self) -> bool {
        !self.crossroads.is_empty()
    }

    pub fn crossroads(&self) -> SideSet {
        self.crossroads
    }

    pub fn connected_cities(&self) -> SideSet {
        self.connected_cities
    }

    /// The edge the road entering at `from` leaves by.
    ///
    /// Returns `Ok(None)` when `from` runs into the crossroads: the road ends
    /// at the junction there.
    pub fn road_connection(&self, from: Side) -> Result<Option<Side>, EdgeError> {
        if !self.edge_has_road(from) {
            return Err(EdgeError::NoRoad(from));
        }
        if self.crossroads.contains(from) {
            return Ok(None);
        }
        Ok(self.through_roads().find(|&s| s != from))
    }

    /// Whether the cities on two edges belong to the same city inside this tile
    pub fn city_connects(&self, a: Side, b: Side) -> bool {
        a == b || (self.connected_cities.contains(a) && self.connected_cities.contains(b))
    }

    /// This tile turned 90° clockwise
    pub fn rotate(&self) -> Tile {
        let mut edges = self.edges;
        for side in Side::ALL {
            edges[side.clockwise().index()] = self.edges[side.index()];
        }
        Tile {
            edges,
            crossroads: self.crossroads.rotate_clockwise(),
            connected_cities: self.connected_cities.rotate_clockwise(),
        }
    }

    /// This tile turned clockwise `turns` quarter turns
    pub fn rotated(&self, turns: u8) -> Tile {
        (0..turns % 4).fold(*self, |tile, _| tile.rotate())
    }

    /// The four orientations of this tile, index = clockwise quarter turns
    pub fn rotations(&self) -> [Tile; 4] {
        [0, 1, 2, 3].map(|turns| self.rotated(turns))
    }
}

impl TryFrom<TileSpec> for Tile {
    type Error = TileError;

    fn try_from(spec: TileSpec) -> Result<Self, Self::Error> {
        let [north, east, south, west] = spec.edges;
        Tile::with_crossroads(north, east, south, west, spec.crossroads)?
            .with_connected_cities(spec.connected_cities)
    }
}

impl From<Tile> for TileSpec {
    fn from(tile: Tile) -> Self {
        TileSpec {
            edges: tile.edges,
            crossroads: tile.crossroads,
            connected_cities: tile.connected_cities,
        }
    }
}
