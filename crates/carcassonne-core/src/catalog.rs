//! Tile catalog: the fixed set of tile layouts a game draws from.
//!
//! The standard catalog holds the sixteen layouts of the base game, keyed
//! `tile01` through `tile16`. Alternative catalogs can be loaded from JSON:
//!
//! ```json
//! [
//!   { "id": "tile09", "edges": ["city", "city", "grass", "grass"],
//!     "connected_cities": ["north", "east"] }
//! ]
//! ```
//!
//! A malformed tile is a bug in the catalog data, so loading stops at the
//! first one.

use crate::grid::Side;
use crate::tile::{EdgeFeature, SideSet, Tile, TileError, TileSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use EdgeFeature::{City, Grass, Road};
use Side::{East, North, South, West};

const fn tile(edges: [EdgeFeature; 4], crossroads: &[Side], cities: &[Side]) -> Tile {
    Tile::from_parts(edges, SideSet::of(crossroads), SideSet::of(cities))
}

/// Id of the tile that starts every board
pub const STARTING_TILE_ID: &str = "tile01";

/// The base game layouts
const STANDARD_TILES: [(&str, Tile); 16] = [
    ("tile01", tile([City, Road, Grass, Road], &[], &[])),
    ("tile02", tile([City, City, Grass, City], &[], &[North, East, West])),
    ("tile03", tile([Road, Road, Road, Road], &[North, East, South, West], &[])),
    ("tile04", tile([City, Road, Road, Grass], &[], &[])),
    ("tile05", tile([City, City, City, City], &[], &[North, East, South, West])),
    ("tile06", tile([Road, Grass, Road, Grass], &[], &[])),
    ("tile07", tile([Grass, City, Grass, City], &[], &[])),
    ("tile08", tile([Grass, City, Grass, City], &[], &[East, West])),
    ("tile09", tile([City, City, Grass, Grass], &[], &[North, East])),
    ("tile10", tile([Grass, Road, Road, Road], &[East, South, West], &[])),
    ("tile11", tile([City, Road, Road, City], &[], &[North, West])),
    ("tile12", tile([City, Grass, Road, Road], &[], &[])),
    ("tile13", tile([City, Road, Road, Road], &[East, South, West], &[])),
    ("tile14", tile([City, City, Grass, Grass], &[], &[])),
    ("tile15", tile([Grass, Grass, Road, Road], &[], &[])),
    ("tile16", tile([City, Grass, Grass, Grass], &[], &[])),
];

/// The tile placed at the origin of a new board: a city on the north edge
/// above an east-west road.
pub const fn starting_tile() -> Tile {
    STANDARD_TILES[0].1
}

/// Errors that abort catalog loading
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tile {id} is malformed: {source}")]
    InvalidTile {
        id: String,
        #[source]
        source: TileError,
    },

    #[error("duplicate tile id {0}")]
    DuplicateId(String),
}

/// One catalog record as stored in JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(flatten)]
    pub tile: TileSpec,
}

/// Tiles keyed by identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileCatalog {
    tiles: BTreeMap<String, Tile>,
}

impl TileCatalog {
    /// The sixteen base game layouts
    pub fn standard() -> Self {
        Self {
            tiles: STANDARD_TILES
                .iter()
                .map(|(id, tile)| (id.to_string(), *tile))
                .collect(),
        }
    }

    /// Build a catalog from records, validating every tile
    pub fn from_entries<I>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = CatalogEntry>,
    {
        let mut tiles = BTreeMap::new();
        for CatalogEntry { id, tile } in entries {
            let tile = Tile::try_from(tile).map_err(|source| CatalogError::InvalidTile {
                id: id.clone(),
                source,
            })?;
            if tiles.contains_key(&id) {
                return Err(CatalogError::DuplicateId(id));
            }
            tiles.insert(id, tile);
        }
        debug!(count = tiles.len(), "loaded tile catalog");
        Ok(Self { tiles })
    }

    /// Parse a JSON array of catalog records
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// The catalog as a JSON array, in id order
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let entries: Vec<CatalogEntry> = self
            .tiles
            .iter()
            .map(|(id, tile)| CatalogEntry {
                id: id.clone(),
                tile: (*tile).into(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    pub fn get(&self, id: &str) -> Option<&Tile> {
        self.tiles.get(id)
    }

    /// Identifiers in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tiles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tile)> {
        self.tiles.iter().map(|(id, tile)| (id.as_str(), tile))
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
