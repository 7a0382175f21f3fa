//! Carcassonne - a tile-laying board engine
//!
//! This crate provides the board logic for a Carcassonne-style game:
//! - Square grid coordinates and tile edges
//! - Tiles with edge features, crossroads and joined cities
//! - The board with placement validation
//! - Road and city tracing across placed tiles
//!
//! Turn order, scoring, the tile deck and player state belong to the caller.
//! The board only answers "can this tile go here" and "what does this edge
//! connect to".
//!
//! # Architecture
//!
//! The engine is platform-agnostic. It can be compiled to:
//! - Native Rust for server-side table hosting
//! - WebAssembly for a browser client
//!
//! # Modules
//!
//! - [`grid`]: Coordinates and sides
//! - [`tile`]: Tile layouts and rotation
//! - [`board`]: Placement and tracing
//! - [`catalog`]: The standard tile set and JSON catalogs

pub mod board;
pub mod catalog;
pub mod grid;
pub mod tile;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use board::{
    Board, BoardError, BoardJson, CityNode, CityTrace, PlaceMode, PlacedTileJson, Placement,
    PlacementRejected, RoadStep,
};
pub use catalog::{starting_tile, CatalogEntry, CatalogError, TileCatalog};
pub use grid::{Coord, Side};
pub use tile::{EdgeError, EdgeFeature, SideSet, Tile, TileError, TileSpec};
