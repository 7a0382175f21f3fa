//! Table management: a shared board and the players sitting at it.

use carcassonne_core::{
    Board, BoardError, BoardJson, CityTrace, Coord, PlaceMode, Placement, PlacementRejected,
    RoadStep, Side, TileCatalog,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::protocol::{PlayerInfo, TableInfo};

/// Seats at one table
const MAX_SEATS: u8 = 5;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Table is full")]
    TableFull,

    #[error("Player not at table")]
    PlayerNotAtTable,

    #[error("Unknown tile: {0}")]
    UnknownTile(String),

    #[error("Placement rejected: {0}")]
    Rejected(#[from] PlacementRejected),

    #[error("Trace failed: {0}")]
    Trace(#[from] BoardError),
}

/// A player seated at a table.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
}

impl RoomPlayer {
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            connected: true,
        }
    }

    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            connected: self.connected,
        }
    }
}

/// A table whose players share one board.
///
/// The table only enforces placement legality. Whose tile comes next is up
/// to the players.
pub struct TableRoom {
    pub id: Uuid,
    pub name: String,
    pub max_players: u8,
    pub host_id: Uuid,
    pub players: HashMap<Uuid, RoomPlayer>,
    /// Seating order
    pub player_order: Vec<Uuid>,
    board: Board,
    catalog: Arc<TileCatalog>,
}

impl TableRoom {
    pub fn new(
        id: Uuid,
        host_id: Uuid,
        host_name: String,
        max_players: u8,
        catalog: Arc<TileCatalog>,
    ) -> Self {
        let mut players = HashMap::new();
        players.insert(host_id, RoomPlayer::new(host_id, host_name.clone()));

        Self {
            id,
            name: format!("{}'s Table", host_name),
            max_players: max_players.clamp(1, MAX_SEATS),
            host_id,
            players,
            player_order: vec![host_id],
            board: Board::new(),
            catalog,
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players as usize
    }

    pub fn add_player(&mut self, player_id: Uuid, name: String) -> Result<(), RoomError> {
        if self.is_full() {
            return Err(RoomError::TableFull);
        }

        self.players.insert(player_id, RoomPlayer::new(player_id, name));
        self.player_order.push(player_id);
        Ok(())
    }

    /// Returns true if the table is now empty
    pub fn remove_player(&mut self, player_id: Uuid) -> Result<bool, RoomError> {
        if self.players.remove(&player_id).is_none() {
            return Err(RoomError::PlayerNotAtTable);
        }
        self.player_order.retain(|&id| id != player_id);

        if player_id == self.host_id {
            if let Some(&next) = self.player_order.first() {
                self.host_id = next;
            }
        }

        Ok(self.players.is_empty())
    }

    /// No seated player is still connected. An empty table is abandoned too.
    pub fn is_abandoned(&self) -> bool {
        self.players.values().all(|p| !p.connected)
    }

    pub fn set_player_connected(&mut self, player_id: Uuid, connected: bool) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.connected = connected;
        }
    }

    /// Preview or commit a catalog tile turned `rotation` quarter turns clockwise
    pub fn place_tile(
        &mut self,
        player_id: Uuid,
        tile_id: &str,
        rotation: u8,
        coord: Coord,
        mode: PlaceMode,
    ) -> Result<Placement, RoomError> {
        if !self.players.contains_key(&player_id) {
            return Err(RoomError::PlayerNotAtTable);
        }
        let tile = self
            .catalog
            .get(tile_id)
            .ok_or_else(|| RoomError::UnknownTile(tile_id.to_string()))?
            .rotated(rotation);

        self.board.add(coord, tile, mode)?;
        if mode == PlaceMode::Commit {
            debug!(table = %self.id, %player_id, tile_id, %coord, "tile placed");
        }

        Ok(Placement {
            coord,
            rotation: rotation % 4,
            tile,
        })
    }

    pub fn legal_placements(&self, tile_id: &str) -> Result<Vec<Placement>, RoomError> {
        let tile = self
            .catalog
            .get(tile_id)
            .ok_or_else(|| RoomError::UnknownTile(tile_id.to_string()))?;
        Ok(self.board.legal_placements(tile))
    }

    /// Border cells in coordinate order
    pub fn border(&self) -> Vec<Coord> {
        let mut coords: Vec<Coord> = self.board.find_map_border().into_iter().collect();
        coords.sort();
        coords
    }

    pub fn trace_road(&self, coord: Coord, side: Side) -> Result<Vec<RoadStep>, RoomError> {
        Ok(self.board.trace_road(coord, side)?)
    }

    pub fn trace_city(&self, coord: Coord, side: Side) -> Result<CityTrace, RoomError> {
        Ok(self.board.trace_city(coord, side)?)
    }

    pub fn board_state(&self) -> BoardJson {
        self.board.to_json_friendly()
    }

    pub fn to_info(&self) -> TableInfo {
        TableInfo {
            id: self.id,
            name: self.name.clone(),
            players: self
                .player_order
                .iter()
                .filter_map(|id| self.players.get(id).map(|p| p.to_info()))
                .collect(),
            max_players: self.max_players,
            host_id: self.host_id,
            tile_count: self.board.len(),
        }
    }
}
