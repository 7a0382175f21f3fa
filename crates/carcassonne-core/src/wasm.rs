//! WebAssembly bindings for the board engine.
//!
//! This module exposes the board to JavaScript through wasm-bindgen. Structured
//! values cross the boundary as JSON strings.

use wasm_bindgen::prelude::*;

use crate::board::{Board, PlaceMode};
use crate::catalog::TileCatalog;
use crate::grid::{Coord, Side};
use crate::tile::Tile;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed board wrapper
#[wasm_bindgen]
pub struct WasmBoard {
    board: Board,
    catalog: TileCatalog,
}

#[wasm_bindgen]
impl WasmBoard {
    /// Create a board with the starting tile at the origin.
    ///
    /// `catalog_json` replaces the standard tile catalog when given.
    #[wasm_bindgen(constructor)]
    pub fn new(catalog_json: Option<String>) -> Result<WasmBoard, JsValue> {
        let catalog = match catalog_json {
            Some(json) => TileCatalog::from_json(&json)
                .map_err(|e| JsValue::from_str(&format!("Invalid catalog: {}", e)))?,
            None => TileCatalog::standard(),
        };

        Ok(WasmBoard {
            board: Board::new(),
            catalog,
        })
    }

    /// Get board state as JSON (for rendering)
    #[wasm_bindgen(js_name = getBoard)]
    pub fn get_board(&self) -> String {
        serde_json::to_string(&self.board.to_json_friendly()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the catalog as a JSON array
    #[wasm_bindgen(js_name = getCatalog)]
    pub fn get_catalog(&self) -> String {
        self.catalog.to_json().unwrap_or_else(|_| "[]".to_string())
    }

    /// Get the empty cells next to the map as a JSON array of coordinates
    #[wasm_bindgen(js_name = getBorder)]
    pub fn get_border(&self) -> String {
        let mut border: Vec<Coord> = self.board.find_map_border().into_iter().collect();
        border.sort();
        serde_json::to_string(&border).unwrap_or_else(|_| "[]".to_string())
    }

    /// Check a placement without committing it. Returns null when legal,
    /// otherwise the rejection as JSON.
    #[wasm_bindgen(js_name = previewTile)]
    pub fn preview_tile(
        &mut self,
        tile_id: &str,
        rotation: u8,
        x: i32,
        y: i32,
    ) -> Result<String, JsValue> {
        self.add(tile_id, rotation, x, y, PlaceMode::DryRun)
    }

    /// Place a tile. Returns null when placed, otherwise the rejection as JSON.
    #[wasm_bindgen(js_name = placeTile)]
    pub fn place_tile(
        &mut self,
        tile_id: &str,
        rotation: u8,
        x: i32,
        y: i32,
    ) -> Result<String, JsValue> {
        self.add(tile_id, rotation, x, y, PlaceMode::Commit)
    }

    /// Every legal spot and rotation for a catalog tile as JSON
    #[wasm_bindgen(js_name = legalPlacements)]
    pub fn legal_placements(&self, tile_id: &str) -> Result<String, JsValue> {
        let tile = self.tile(tile_id)?;
        let placements = self.board.legal_placements(&tile);
        Ok(serde_json::to_string(&placements).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Trace the road through an edge (0=N, 1=E, 2=S, 3=W) as a JSON array of steps
    #[wasm_bindgen(js_name = traceRoad)]
    pub fn trace_road(&self, x: i32, y: i32, side: u8) -> Result<String, JsValue> {
        let side = Side::try_from(side).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let path = self
            .board
            .trace_road(Coord::new(x, y), side)
            .map_err(|e| JsValue::from_str(&format!("Trace failed: {}", e)))?;
        Ok(serde_json::to_string(&path).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Trace the city on an edge (0=N, 1=E, 2=S, 3=W) as JSON
    #[wasm_bindgen(js_name = traceCity)]
    pub fn trace_city(&self, x: i32, y: i32, side: u8) -> Result<String, JsValue> {
        let side = Side::try_from(side).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let city = self
            .board
            .trace_city(Coord::new(x, y), side)
            .map_err(|e| JsValue::from_str(&format!("Trace failed: {}", e)))?;
        Ok(serde_json::to_string(&city).unwrap_or_else(|_| "{}".to_string()))
    }
}

impl WasmBoard {
    fn tile(&self, tile_id: &str) -> Result<Tile, JsValue> {
        self.catalog
            .get(tile_id)
            .copied()
            .ok_or_else(|| JsValue::from_str(&format!("Unknown tile: {}", tile_id)))
    }

    fn add(
        &mut self,
        tile_id: &str,
        rotation: u8,
        x: i32,
        y: i32,
        mode: PlaceMode,
    ) -> Result<String, JsValue> {
        let tile = self.tile(tile_id)?.rotated(rotation);
        match self.board.add(Coord::new(x, y), tile, mode) {
            Ok(()) => Ok("null".to_string()),
            Err(rejection) => {
                Ok(serde_json::to_string(&rejection).unwrap_or_else(|_| "{}".to_string()))
            }
        }
    }
}
