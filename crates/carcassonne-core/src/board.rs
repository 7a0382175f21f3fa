//! The tile board: placement validation and feature tracing.
//!
//! This module contains:
//! - The `Board` itself, a sparse map from grid cell to placed tile
//! - Placement checks (map border plus edge matching)
//! - Road tracing across tiles, in one or both directions
//! - City tracing as a breadth-first walk over (cell, edge) city segments

use crate::catalog;
use crate::grid::{Coord, Side};
use crate::tile::{EdgeError, EdgeFeature, Tile};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;
use tracing::{debug, trace};

/// How `Board::add` treats a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceMode {
    /// Validate, then store the tile
    Commit,
    /// Validate only; the board is left unchanged
    DryRun,
    /// Store without validation (bootstrapping and tests)
    Unchecked,
}

/// Why a tile may not go where it was offered.
///
/// Rejection is a normal outcome during play, not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PlacementRejected {
    #[error("{0} is not on the border of the map")]
    NotOnBorder(Coord),

    #[error("{side} edge at {coord} is {placed} but the neighboring edge is {neighbor}")]
    EdgeMismatch {
        coord: Coord,
        side: Side,
        placed: EdgeFeature,
        neighbor: EdgeFeature,
    },
}

/// Errors from feature tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("no tile at {0}")]
    Unoccupied(Coord),

    #[error(transparent)]
    Edge(#[from] EdgeError),
}

/// One tile on a traced road.
///
/// `entry` is the edge the road comes in by and `exit` the edge it leaves
/// by. `None` means the road ends in a crossroads on this tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoadStep {
    pub coord: Coord,
    pub entry: Option<Side>,
    pub exit: Option<Side>,
}

impl RoadStep {
    pub const fn new(coord: Coord, entry: Option<Side>, exit: Option<Side>) -> Self {
        Self { coord, entry, exit }
    }

    /// The same step walked the other way
    pub const fn reversed(self) -> Self {
        Self {
            coord: self.coord,
            entry: self.exit,
            exit: self.entry,
        }
    }
}

/// One city segment: the city on one edge of one placed tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CityNode {
    pub coord: Coord,
    pub side: Side,
}

impl CityNode {
    pub const fn new(coord: Coord, side: Side) -> Self {
        Self { coord, side }
    }
}

/// Result of tracing a city
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityTrace {
    /// No segment of the city faces an empty cell
    pub complete: bool,
    /// Every segment reachable from the starting one
    pub nodes: HashSet<CityNode>,
}

/// A legal spot for some orientation of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub coord: Coord,
    /// Clockwise quarter turns applied to the offered tile
    pub rotation: u8,
    pub tile: Tile,
}

/// The board of placed tiles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    tiles: HashMap<Coord, Tile>,
}

impl Board {
    /// Create a board holding the standard starting tile at the origin
    pub fn new() -> Self {
        Self::with_start(catalog::starting_tile())
    }

    /// Create a board holding `start` at the origin
    pub fn with_start(start: Tile) -> Self {
        Self {
            tiles: HashMap::from([(Coord::ORIGIN, start)]),
        }
    }

    // ==================== Query Methods ====================

    /// Tile at a coordinate, if any
    pub fn get(&self, coord: Coord) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    pub fn is_occupied(&self, coord: Coord) -> bool {
        self.tiles.contains_key(&coord)
    }

    /// All occupied coordinates
    pub fn all_coords(&self) -> HashSet<Coord> {
        self.tiles.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Tile)> {
        self.tiles.iter().map(|(coord, tile)| (*coord, tile))
    }

    /// Number of placed tiles
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Empty cells sharing an edge with at least one placed tile.
    ///
    /// Recomputed from scratch on every call.
    pub fn find_map_border(&self) -> HashSet<Coord> {
        self.tiles
            .keys()
            .flat_map(|coord| coord.neighbors())
            .filter(|coord| !self.tiles.contains_key(coord))
            .collect()
    }

    fn is_on_border(&self, coord: Coord) -> bool {
        !self.is_occupied(coord) && coord.neighbors().iter().any(|n| self.is_occupied(*n))
    }

    // ==================== Placement ====================

    /// Check whether `tile` may be placed at `coord` without changing the board
    pub fn check_placement(&self, coord: Coord, tile: &Tile) -> Result<(), PlacementRejected> {
        if !self.is_on_border(coord) {
            return Err(PlacementRejected::NotOnBorder(coord));
        }

        for side in Side::ALL {
            if let Some(neighbor) = self.tiles.get(&coord.neighbor(side)) {
                let placed = tile.edge(side);
                let facing = neighbor.edge(side.opposite());
                if placed != facing {
                    return Err(PlacementRejected::EdgeMismatch {
                        coord,
                        side,
                        placed,
                        neighbor: facing,
                    });
                }
            }
        }

        Ok(())
    }

    pub fn can_place(&self, coord: Coord, tile: &Tile) -> bool {
        self.check_placement(coord, tile).is_ok()
    }

    /// Place a tile.
    ///
    /// A rejected placement never changes the board. `PlaceMode::DryRun`
    /// reports the same outcome `PlaceMode::Commit` would, without storing.
    pub fn add(
        &mut self,
        coord: Coord,
        tile: Tile,
        mode: PlaceMode,
    ) -> Result<(), PlacementRejected> {
        if mode != PlaceMode::Unchecked {
            if let Err(rejection) = self.check_placement(coord, &tile) {
                debug!(%coord, %rejection, "placement rejected");
                return Err(rejection);
            }
        }
        if mode != PlaceMode::DryRun {
            self.tiles.insert(coord, tile);
        }
        Ok(())
    }

    /// Validate and commit a placement
    pub fn place(&mut self, coord: Coord, tile: Tile) -> Result<(), PlacementRejected> {
        self.add(coord, tile, PlaceMode::Commit)
    }

    /// Every border cell and orientation where `tile` fits, ordered by
    /// coordinate then rotation. Symmetric tiles list each equivalent
    /// orientation separately.
    pub fn legal_placements(&self, tile: &Tile) -> Vec<Placement> {
        let mut border: Vec<Coord> = self.find_map_border().into_iter().collect();
        border.sort();

        let rotations = tile.rotations();
        border
            .into_iter()
            .flat_map(|coord| {
                (0u8..4).filter_map(move |rotation| {
                    let tile = rotations[rotation as usize];
                    self.can_place(coord, &tile).then_some(Placement {
                        coord,
                        rotation,
                        tile,
                    })
                })
            })
            .collect()
    }

    // ==================== Road Tracing ====================

    /// Follow a road out of `coord` across `side` until it leaves the map,
    /// runs into a crossroads, or loops back to where it started.
    ///
    /// The starting tile itself is only recorded when the road loops back
    /// to it.
    pub fn trace_road_one_direction(&self, coord: Coord, side: Side) -> Vec<RoadStep> {
        let mut steps = Vec::new();
        let mut leaving = side;
        let mut current = coord.neighbor(side);

        while let Some(tile) = self.tiles.get(&current) {
            let entry = leaving.opposite();
            // Only reachable on boards built with unchecked placements
            let Ok(exit) = tile.road_connection(entry) else {
                break;
            };
            steps.push(RoadStep::new(current, Some(entry), exit));

            let Some(exit) = exit else {
                break;
            };
            if current == coord && exit == side {
                break;
            }
            leaving = exit;
            current = current.neighbor(exit);
        }

        steps
    }

    /// The whole road through the `side` edge of the tile at `coord`, in
    /// travel order ending in the direction of `side`.
    pub fn trace_road(&self, coord: Coord, side: Side) -> Result<Vec<RoadStep>, BoardError> {
        let tile = self.get(coord).ok_or(BoardError::Unoccupied(coord))?;
        let connection = tile.road_connection(side)?;
        let forward = self.trace_road_one_direction(coord, side);

        let closing = RoadStep::new(coord, connection, Some(side));
        if forward.last() == Some(&closing) {
            trace!(%coord, %side, len = forward.len(), "road is a closed loop");
            return Ok(forward);
        }

        let Some(connection) = connection else {
            // The road starts at a crossroads on this tile
            let mut path = Vec::with_capacity(forward.len() + 1);
            path.push(closing);
            path.extend(forward);
            return Ok(path);
        };

        let backward = self.trace_road_one_direction(coord, connection);
        let mut path: Vec<RoadStep> = backward.into_iter().rev().map(RoadStep::reversed).collect();
        path.push(closing);
        path.extend(forward);

        trace!(%coord, %side, len = path.len(), "traced road");
        Ok(path)
    }

    // ==================== City Tracing ====================

    /// Collect every city segment joined to the city on `side` of the tile at
    /// `coord`, and whether the city is closed.
    pub fn trace_city(&self, coord: Coord, side: Side) -> Result<CityTrace, BoardError> {
        if !self.is_occupied(coord) {
            return Err(BoardError::Unoccupied(coord));
        }

        let start = CityNode::new(coord, side);
        let mut nodes = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut complete = true;

        while let Some(node) = queue.pop_front() {
            let Some(tile) = self.tiles.get(&node.coord) else {
                continue;
            };

            for other in Side::ALL {
                if other != node.side && tile.city_connects(node.side, other) {
                    let joined = CityNode::new(node.coord, other);
                    if nodes.insert(joined) {
                        queue.push_back(joined);
                    }
                }
            }

            // Edge matching is not re-checked here, that is up to `add`
            let across = node.coord.neighbor(node.side);
            if self.is_occupied(across) {
                let continued = CityNode::new(across, node.side.opposite());
                if nodes.insert(continued) {
                    queue.push_back(continued);
                }
            } else {
                complete = false;
            }
        }

        trace!(%coord, %side, complete, segments = nodes.len(), "traced city");
        Ok(CityTrace { complete, nodes })
    }

    /// Convert to a JSON-friendly representation with a list instead of a map,
    /// since JSON object keys cannot be coordinates
    pub fn to_json_friendly(&self) -> BoardJson {
        let mut tiles: Vec<PlacedTileJson> = self
            .tiles
            .iter()
            .map(|(coord, tile)| PlacedTileJson {
                x: coord.x,
                y: coord.y,
                tile: *tile,
            })
            .collect();
        tiles.sort_by_key(|t| (t.x, t.y));
        BoardJson { tiles }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON-friendly board representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardJson {
    pub tiles: Vec<PlacedTileJson>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTileJson {
    pub x: i32,
    pub y: i32,
    pub tile: Tile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TileCatalog;
    use crate::tile::EdgeFeature::{City, Grass, Road};
    use crate::tile::SideSet;

    fn standard(id: &str) -> Tile {
        *TileCatalog::standard().get(id).unwrap()
    }

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    #[test]
    fn test_new_board_has_start_tile() {
        let board = Board::new();
        assert_eq!(board.len(), 1);
        assert_eq!(board.get(Coord::ORIGIN), Some(&catalog::starting_tile()));
        assert_eq!(board.all_coords(), HashSet::from([Coord::ORIGIN]));
        assert_eq!(board.get(c(0, 1)), None);
    }

    #[test]
    fn test_initial_border() {
        let board = Board::new();
        assert_eq!(
            board.find_map_border(),
            HashSet::from([c(0, 1), c(1, 0), c(0, -1), c(-1, 0)])
        );
    }

    #[test]
    fn test_border_excludes_occupied_and_diagonals() {
        let mut board = Board::new();
        board.add(c(1, 0), standard("tile06").rotate(), PlaceMode::Commit).unwrap();

        let border = board.find_map_border();
        assert_eq!(border.len(), 6);
        assert!(!border.contains(&Coord::ORIGIN));
        assert!(!border.contains(&c(1, 0)));
        assert!(border.contains(&c(2, 0)));
        assert!(border.contains(&c(1, 1)));
        assert!(!border.contains(&c(2, 1)));
    }

    #[test]
    fn test_city_against_grass_is_rejected() {
        let mut board = Board::new();
        let before = board.clone();

        let result = board.add(c(0, 1), standard("tile16"), PlaceMode::Commit);
        assert_eq!(
            result,
            Err(PlacementRejected::EdgeMismatch {
                coord: c(0, 1),
                side: Side::South,
                placed: Grass,
                neighbor: City,
            })
        );
        assert_eq!(board, before);
    }

    #[test]
    fn test_city_below_start_is_rejected() {
        let mut board = Board::new();
        let result = board.add(c(0, -1), standard("tile09"), PlaceMode::Commit);
        assert!(matches!(
            result,
            Err(PlacementRejected::EdgeMismatch { side: Side::North, .. })
        ));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_placement_off_border_is_rejected() {
        let mut board = Board::new();
        let tile = standard("tile16");
        assert_eq!(
            board.add(c(5, 5), tile, PlaceMode::Commit),
            Err(PlacementRejected::NotOnBorder(c(5, 5)))
        );
        assert_eq!(
            board.add(Coord::ORIGIN, tile, PlaceMode::Commit),
            Err(PlacementRejected::NotOnBorder(Coord::ORIGIN))
        );
    }

    #[test]
    fn test_dry_run_matches_commit_without_storing() {
        let mut board = Board::new();
        let tile = standard("tile16").rotated(2);

        assert_eq!(board.add(c(0, 1), tile, PlaceMode::DryRun), Ok(()));
        assert!(!board.is_occupied(c(0, 1)));

        assert_eq!(board.add(c(0, 1), tile, PlaceMode::Commit), Ok(()));
        assert_eq!(board.get(c(0, 1)), Some(&tile));
    }

    #[test]
    fn test_unchecked_add_skips_validation() {
        let mut board = Board::new();
        let tile = standard("tile16");
        assert_eq!(board.add(c(7, 7), tile, PlaceMode::Unchecked), Ok(()));
        assert_eq!(board.get(c(7, 7)), Some(&tile));
    }

    #[test]
    fn test_legal_placements() {
        let board = Board::new();
        // A lone city edge fits only north of the start tile, facing south
        let placements = board.legal_placements(&standard("tile16"));
        let spots: Vec<(Coord, u8)> = placements.iter().map(|p| (p.coord, p.rotation)).collect();

        assert!(spots.contains(&(c(0, 1), 2)));
        assert!(!spots.contains(&(c(0, 1), 0)));
        for placement in &placements {
            assert!(board.can_place(placement.coord, &placement.tile));
        }
        let mut sorted = spots.clone();
        sorted.sort();
        assert_eq!(spots, sorted);
    }

    #[test]
    fn test_trace_road_straight() {
        let mut board = Board::new();
        board.place(c(1, 0), standard("tile06").rotate()).unwrap();

        let east = board.trace_road(Coord::ORIGIN, Side::East).unwrap();
        assert_eq!(
            east,
            vec![
                RoadStep::new(c(0, 0), Some(Side::West), Some(Side::East)),
                RoadStep::new(c(1, 0), Some(Side::West), Some(Side::East)),
            ]
        );

        let west = board.trace_road(c(1, 0), Side::West).unwrap();
        let reversed: Vec<RoadStep> = east.iter().rev().map(|s| s.reversed()).collect();
        assert_eq!(west, reversed);
    }

    #[test]
    fn test_trace_road_into_crossroads() {
        let mut board = Board::new();
        board.place(c(1, 0), standard("tile03")).unwrap();

        assert_eq!(
            board.trace_road(Coord::ORIGIN, Side::East).unwrap(),
            vec![
                RoadStep::new(c(0, 0), Some(Side::West), Some(Side::East)),
                RoadStep::new(c(1, 0), Some(Side::West), None),
            ]
        );
        assert_eq!(
            board.trace_road(c(1, 0), Side::West).unwrap(),
            vec![
                RoadStep::new(c(1, 0), None, Some(Side::West)),
                RoadStep::new(c(0, 0), Some(Side::East), Some(Side::West)),
            ]
        );
    }

    #[test]
    fn test_trace_road_one_direction_stops_at_empty_cell() {
        let board = Board::new();
        assert!(board.trace_road_one_direction(Coord::ORIGIN, Side::East).is_empty());
    }

    #[test]
    fn test_trace_road_errors() {
        let board = Board::new();
        assert_eq!(
            board.trace_road(c(3, 3), Side::East),
            Err(BoardError::Unoccupied(c(3, 3)))
        );
        assert_eq!(
            board.trace_road(Coord::ORIGIN, Side::North),
            Err(BoardError::Edge(EdgeError::NoRoad(Side::North)))
        );
    }

    #[test]
    fn test_trace_road_stops_at_mismatched_unchecked_tile() {
        let mut board = Board::new();
        board.add(c(1, 0), standard("tile16"), PlaceMode::Unchecked).unwrap();
        assert!(board.trace_road_one_direction(Coord::ORIGIN, Side::East).is_empty());
    }

    #[test]
    fn test_trace_city_trusts_occupied_neighbors() {
        let mut board = Board::new();
        // Grass faces the start tile's city, allowed only when unchecked
        board.add(c(0, 1), standard("tile16"), PlaceMode::Unchecked).unwrap();

        let trace = board.trace_city(Coord::ORIGIN, Side::North).unwrap();
        assert!(trace.complete);
        assert_eq!(
            trace.nodes,
            HashSet::from([
                CityNode::new(c(0, 0), Side::North),
                CityNode::new(c(0, 1), Side::South),
            ])
        );
    }

    #[test]
    fn test_trace_open_city() {
        let board = Board::new();
        let trace = board.trace_city(Coord::ORIGIN, Side::North).unwrap();
        assert!(!trace.complete);
        assert_eq!(trace.nodes, HashSet::from([CityNode::new(Coord::ORIGIN, Side::North)]));
    }

    #[test]
    fn test_trace_closed_two_tile_city() {
        let mut board = Board::with_start(standard("tile16"));
        board.place(c(0, 1), standard("tile16").rotated(2)).unwrap();

        let trace = board.trace_city(Coord::ORIGIN, Side::North).unwrap();
        assert!(trace.complete);
        assert_eq!(
            trace.nodes,
            HashSet::from([
                CityNode::new(c(0, 0), Side::North),
                CityNode::new(c(0, 1), Side::South),
            ])
        );
    }

    #[test]
    fn test_trace_city_follows_connected_edges() {
        let mut board = Board::new();
        // City on S and W, joined inside the tile
        board.place(c(0, 1), standard("tile09").rotated(2)).unwrap();

        let open = board.trace_city(Coord::ORIGIN, Side::North).unwrap();
        assert!(!open.complete);
        assert_eq!(open.nodes.len(), 3);
        assert!(open.nodes.contains(&CityNode::new(c(0, 1), Side::West)));

        // Cap the west end with a single city edge facing east
        board.place(c(-1, 1), standard("tile16").rotate()).unwrap();
        let closed = board.trace_city(c(-1, 1), Side::East).unwrap();
        assert!(closed.complete);
        assert_eq!(closed.nodes.len(), 4);
    }

    #[test]
    fn test_trace_city_ignores_unconnected_city_edges() {
        // Two separate city caps on E and W
        let tile = Tile::new(Grass, City, Grass, City).unwrap();
        let board = Board::with_start(tile);
        let trace = board.trace_city(Coord::ORIGIN, Side::East).unwrap();
        assert_eq!(trace.nodes, HashSet::from([CityNode::new(Coord::ORIGIN, Side::East)]));

        let joined = tile.with_connected_cities(SideSet::from([Side::East, Side::West])).unwrap();
        let board = Board::with_start(joined);
        let trace = board.trace_city(Coord::ORIGIN, Side::East).unwrap();
        assert_eq!(trace.nodes.len(), 2);
        assert!(!trace.complete);
    }

    #[test]
    fn test_trace_city_from_empty_cell() {
        let board = Board::new();
        assert_eq!(
            board.trace_city(c(0, 9), Side::North),
            Err(BoardError::Unoccupied(c(0, 9)))
        );
    }

    #[test]
    fn test_trace_city_from_edge_without_city() {
        let board = Board::new();
        // The east edge carries a road, so nothing joins it inside the tile
        let trace = board.trace_city(Coord::ORIGIN, Side::East).unwrap();
        assert!(!trace.complete);
        assert_eq!(trace.nodes, HashSet::from([CityNode::new(Coord::ORIGIN, Side::East)]));
    }

    #[test]
    fn test_json_friendly_is_sorted() {
        let mut board = Board::new();
        board.place(c(-1, 0), Tile::new(Grass, Road, Grass, Road).unwrap()).unwrap();
        let json = board.to_json_friendly();
        assert_eq!(json.tiles.len(), 2);
        assert_eq!((json.tiles[0].x, json.tiles[0].y), (-1, 0));
        assert!(serde_json::to_string(&json).is_ok());
    }
}
