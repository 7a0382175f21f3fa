//! WebSocket protocol messages for shared-board tables.

use carcassonne_core::{BoardJson, CityTrace, Coord, Placement, PlacementRejected, RoadStep, Side};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Open a new table
    CreateTable { player_name: String, max_players: u8 },

    /// Sit down at an existing table
    JoinTable { table_id: Uuid, player_name: String },

    /// Leave current table
    LeaveTable,

    /// Request the list of tables with free seats
    ListTables,

    /// Request the current board
    GetBoard,

    /// Request the empty cells next to the map
    GetBorder,

    /// Check a placement without committing it
    PreviewTile {
        tile_id: String,
        rotation: u8,
        x: i32,
        y: i32,
    },

    /// Commit a placement
    PlaceTile {
        tile_id: String,
        rotation: u8,
        x: i32,
        y: i32,
    },

    /// Request every spot where a catalog tile fits
    LegalPlacements { tile_id: String },

    /// Trace the road through an edge
    TraceRoad { x: i32, y: i32, side: Side },

    /// Trace the city on an edge
    TraceCity { x: i32, y: i32, side: Side },

    /// Send chat message
    Chat { message: String },

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned player ID
    Welcome { player_id: Uuid },

    /// Table created successfully
    TableCreated { table_id: Uuid },

    /// Joined table successfully
    JoinedTable { table: TableInfo },

    /// Left table successfully
    LeftTable,

    /// Table seating changed
    TableUpdated { table: TableInfo },

    /// Full board snapshot
    BoardState { board: BoardJson },

    /// Empty cells next to the map, sorted
    Border { coords: Vec<Coord> },

    /// Outcome of a preview or placement, sent to the requester
    PlacementResult {
        accepted: bool,
        dry_run: bool,
        rejection: Option<PlacementRejected>,
    },

    /// A tile was committed to the board
    TilePlaced {
        player_id: Uuid,
        tile_id: String,
        placement: Placement,
    },

    /// Legal spots for a catalog tile
    Placements {
        tile_id: String,
        placements: Vec<Placement>,
    },

    /// Road path in travel order
    RoadTraced { path: Vec<RoadStep> },

    /// City segments and whether the city is closed
    CityTraced { city: CityTrace },

    /// Chat message received
    ChatMessage { player_name: String, message: String },

    /// List of tables with free seats
    TableList { tables: Vec<TableInfo> },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}

/// Table information for clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub id: Uuid,
    pub name: String,
    pub players: Vec<PlayerInfo>,
    pub max_players: u8,
    pub host_id: Uuid,
    /// Tiles on the board, including the starting tile
    pub tile_count: usize,
}

/// Player information at a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let text = r#"{"type":"TraceRoad","payload":{"x":1,"y":-2,"side":"east"}}"#;
        match serde_json::from_str::<ClientMessage>(text).unwrap() {
            ClientMessage::TraceRoad { x, y, side } => {
                assert_eq!((x, y, side), (1, -2, Side::East));
            }
            other => panic!("unexpected message {other:?}"),
        }

        let ping: ClientMessage = serde_json::from_str(r#"{"type":"Ping"}"#).unwrap();
        assert!(matches!(ping, ClientMessage::Ping));
    }

    #[test]
    fn test_rejection_is_sent_as_data() {
        let msg = ServerMessage::PlacementResult {
            accepted: false,
            dry_run: true,
            rejection: Some(PlacementRejected::NotOnBorder(Coord::new(3, 3))),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "PlacementResult");
        assert_eq!(value["payload"]["rejection"]["NotOnBorder"]["x"], 3);
    }
}
