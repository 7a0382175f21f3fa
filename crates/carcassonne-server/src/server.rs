//! WebSocket server and connection handling.

use crate::protocol::{ClientMessage, ServerMessage, TableInfo};
use crate::room::{RoomError, TableRoom};
use carcassonne_core::{Coord, PlaceMode, TileCatalog};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Tables, seats and outgoing channels, shared by every connection task.
pub struct ServerState {
    /// Open tables by id
    pub tables: DashMap<Uuid, TableRoom>,
    /// Which table each seated player is at
    pub player_tables: DashMap<Uuid, Uuid>,
    /// Outgoing queue per connected player
    pub player_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    /// Tiles every table draws from
    pub catalog: Arc<TileCatalog>,
}

impl ServerState {
    pub fn new(catalog: TileCatalog) -> Self {
        Self {
            tables: DashMap::new(),
            player_tables: DashMap::new(),
            player_senders: DashMap::new(),
            catalog: Arc::new(catalog),
        }
    }

    /// Queue a message for one player. Players that already left are skipped.
    pub fn send_to_player(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    fn send_error(&self, player_id: Uuid, message: impl Into<String>) {
        self.send_to_player(
            player_id,
            ServerMessage::Error {
                message: message.into(),
            },
        );
    }

    pub fn broadcast_to_table(&self, table_id: Uuid, msg: ServerMessage) {
        if let Some(table) = self.tables.get(&table_id) {
            for player_id in table.players.keys() {
                self.send_to_player(*player_id, msg.clone());
            }
        }
    }

    pub fn broadcast_to_table_except(&self, table_id: Uuid, except: Uuid, msg: ServerMessage) {
        if let Some(table) = self.tables.get(&table_id) {
            for player_id in table.players.keys() {
                if *player_id != except {
                    self.send_to_player(*player_id, msg.clone());
                }
            }
        }
    }

    /// Tables with a free seat.
    pub fn get_open_tables(&self) -> Vec<TableInfo> {
        self.tables
            .iter()
            .filter(|t| !t.is_full())
            .map(|t| t.to_info())
            .collect()
    }

    /// The table a player sits at, if any.
    fn table_of(&self, player_id: Uuid) -> Option<Uuid> {
        self.player_tables.get(&player_id).map(|id| *id)
    }
}

/// Accept WebSocket clients until the listener fails.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Carcassonne server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// One client from handshake to disconnect.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let player_id = Uuid::new_v4();

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.player_senders.insert(player_id, tx);

    let welcome = ServerMessage::Welcome { player_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text.into())).await?;

    // Writer half drains the player's queue
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(player_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", player_id, e);
                    state.send_error(player_id, format!("Invalid message: {}", e));
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", player_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_player(player_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    handle_disconnect(player_id, &state);
    state.player_senders.remove(&player_id);
    send_task.abort();

    info!("Connection closed for {}", player_id);
    Ok(())
}

fn handle_message(player_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::CreateTable {
            player_name,
            max_players,
        } => {
            leave_table(player_id, state);

            let table_id = Uuid::new_v4();
            let table = TableRoom::new(
                table_id,
                player_id,
                player_name,
                max_players,
                Arc::clone(&state.catalog),
            );
            let table_info = table.to_info();

            state.tables.insert(table_id, table);
            state.player_tables.insert(player_id, table_id);
            info!("Player {} opened table {}", player_id, table_id);

            state.send_to_player(player_id, ServerMessage::TableCreated { table_id });
            state.send_to_player(player_id, ServerMessage::JoinedTable { table: table_info });
        }

        ClientMessage::JoinTable {
            table_id,
            player_name,
        } => {
            leave_table(player_id, state);

            let Some(mut table) = state.tables.get_mut(&table_id) else {
                state.send_error(player_id, "Table not found");
                return;
            };
            match table.add_player(player_id, player_name) {
                Ok(()) => {
                    let table_info = table.to_info();
                    let board = table.board_state();
                    state.player_tables.insert(player_id, table_id);
                    drop(table); // Release lock before broadcasting

                    state.send_to_player(
                        player_id,
                        ServerMessage::JoinedTable {
                            table: table_info.clone(),
                        },
                    );
                    state.send_to_player(player_id, ServerMessage::BoardState { board });
                    state.broadcast_to_table_except(
                        table_id,
                        player_id,
                        ServerMessage::TableUpdated { table: table_info },
                    );
                }
                Err(e) => {
                    drop(table);
                    state.send_error(player_id, e.to_string());
                }
            }
        }

        ClientMessage::LeaveTable => {
            if leave_table(player_id, state) {
                state.send_to_player(player_id, ServerMessage::LeftTable);
            }
        }

        ClientMessage::ListTables => {
            let tables = state.get_open_tables();
            state.send_to_player(player_id, ServerMessage::TableList { tables });
        }

        ClientMessage::GetBoard => {
            with_table(player_id, state, |table| {
                Ok(ServerMessage::BoardState {
                    board: table.board_state(),
                })
            });
        }

        ClientMessage::GetBorder => {
            with_table(player_id, state, |table| {
                Ok(ServerMessage::Border {
                    coords: table.border(),
                })
            });
        }

        ClientMessage::PreviewTile {
            tile_id,
            rotation,
            x,
            y,
        } => {
            let coord = Coord::new(x, y);
            place_tile(player_id, state, tile_id, rotation, coord, PlaceMode::DryRun)
        }

        ClientMessage::PlaceTile {
            tile_id,
            rotation,
            x,
            y,
        } => {
            let coord = Coord::new(x, y);
            place_tile(player_id, state, tile_id, rotation, coord, PlaceMode::Commit)
        }

        ClientMessage::LegalPlacements { tile_id } => {
            with_table(player_id, state, |table| {
                let placements = table.legal_placements(&tile_id)?;
                Ok(ServerMessage::Placements {
                    tile_id: tile_id.clone(),
                    placements,
                })
            });
        }

        ClientMessage::TraceRoad { x, y, side } => {
            with_table(player_id, state, |table| {
                let path = table.trace_road(Coord::new(x, y), side)?;
                Ok(ServerMessage::RoadTraced { path })
            });
        }

        ClientMessage::TraceCity { x, y, side } => {
            with_table(player_id, state, |table| {
                let city = table.trace_city(Coord::new(x, y), side)?;
                Ok(ServerMessage::CityTraced { city })
            });
        }

        ClientMessage::Chat { message } => {
            if let Some(table_id) = state.table_of(player_id) {
                let player_name = state
                    .tables
                    .get(&table_id)
                    .and_then(|t| t.players.get(&player_id).map(|p| p.name.clone()))
                    .unwrap_or_else(|| "Unknown".to_string());

                state.broadcast_to_table(
                    table_id,
                    ServerMessage::ChatMessage {
                        player_name,
                        message,
                    },
                );
            }
        }

        ClientMessage::Ping => {
            state.send_to_player(player_id, ServerMessage::Pong);
        }
    }
}

/// Run a read-only query against the player's table and send the reply.
fn with_table<F>(player_id: Uuid, state: &ServerState, query: F)
where
    F: FnOnce(&TableRoom) -> Result<ServerMessage, RoomError>,
{
    let Some(table_id) = state.table_of(player_id) else {
        state.send_error(player_id, "Not at a table");
        return;
    };
    let reply = match state.tables.get(&table_id) {
        Some(table) => query(&table),
        None => {
            state.send_error(player_id, "Table not found");
            return;
        }
    };
    match reply {
        Ok(msg) => state.send_to_player(player_id, msg),
        Err(e) => state.send_error(player_id, e.to_string()),
    }
}

/// Preview or commit a placement. Rejections go back to the requester as a
/// result, commits are broadcast to the whole table.
fn place_tile(
    player_id: Uuid,
    state: &ServerState,
    tile_id: String,
    rotation: u8,
    coord: Coord,
    mode: PlaceMode,
) {
    let Some(table_id) = state.table_of(player_id) else {
        state.send_error(player_id, "Not at a table");
        return;
    };
    let Some(mut table) = state.tables.get_mut(&table_id) else {
        state.send_error(player_id, "Table not found");
        return;
    };

    let result = table.place_tile(player_id, &tile_id, rotation, coord, mode);
    let table_info = table.to_info();
    drop(table);

    let dry_run = mode == PlaceMode::DryRun;
    match result {
        Ok(placement) => {
            state.send_to_player(
                player_id,
                ServerMessage::PlacementResult {
                    accepted: true,
                    dry_run,
                    rejection: None,
                },
            );
            if !dry_run {
                state.broadcast_to_table(
                    table_id,
                    ServerMessage::TilePlaced {
                        player_id,
                        tile_id,
                        placement,
                    },
                );
                state.broadcast_to_table(
                    table_id,
                    ServerMessage::TableUpdated { table: table_info },
                );
            }
        }
        Err(RoomError::Rejected(rejection)) => {
            state.send_to_player(
                player_id,
                ServerMessage::PlacementResult {
                    accepted: false,
                    dry_run,
                    rejection: Some(rejection),
                },
            );
        }
        Err(e) => state.send_error(player_id, e.to_string()),
    }
}

/// Remove a player from their table. Returns whether the player was seated
/// anywhere.
fn leave_table(player_id: Uuid, state: &ServerState) -> bool {
    let Some((_, table_id)) = state.player_tables.remove(&player_id) else {
        return false;
    };

    if let Some(mut table) = state.tables.get_mut(&table_id) {
        if let Err(e) = table.remove_player(player_id) {
            warn!("Player {} missing from table {}: {}", player_id, table_id, e);
        }
    }
    close_or_update(table_id, state);
    true
}

/// Handle player disconnect.
///
/// The seat stays taken so the rest of the table sees who dropped out.
fn handle_disconnect(player_id: Uuid, state: &ServerState) {
    let Some((_, table_id)) = state.player_tables.remove(&player_id) else {
        return;
    };

    if let Some(mut table) = state.tables.get_mut(&table_id) {
        table.set_player_connected(player_id, false);
    }
    close_or_update(table_id, state);
}

/// Close a table nobody connected sits at, otherwise tell the rest of the
/// table about the seating change.
fn close_or_update(table_id: Uuid, state: &ServerState) {
    if state
        .tables
        .remove_if(&table_id, |_, table| table.is_abandoned())
        .is_some()
    {
        info!("Table {} closed", table_id);
        return;
    }

    let Some(table) = state.tables.get(&table_id) else {
        return;
    };
    let table_info = table.to_info();
    drop(table);
    state.broadcast_to_table(table_id, ServerMessage::TableUpdated { table: table_info });
}
