use contact_types::{PlayerId, RoomId, ServerMessage};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One live WebSocket. A connection starts anonymous and binds to a player
/// seat when the client joins a room or resumes a session.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub player_id: Option<PlayerId>,
    pub room_id: Option<RoomId>,
    pub nickname: Option<String>,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let now = Instant::now();

        let connection = Self {
            id,
            player_id: None,
            room_id: None,
            nickname: None,
            connected_at: now,
            last_activity: now,
            sender,
        };

        (connection, receiver)
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn bind(&mut self, player_id: PlayerId, room_id: RoomId, nickname: String) {
        self.player_id = Some(player_id);
        self.room_id = Some(room_id);
        self.nickname = Some(nickname);
    }

    pub fn unbind(&mut self) {
        self.player_id = None;
        self.room_id = None;
        self.nickname = None;
    }

    pub fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| "Connection closed".to_string())
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// Tracks every live connection and which player seat each one holds. A
/// player has at most one bound connection; a fresh socket for the same
/// player takes the seat over from the old one.
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
    player_to_connection: RwLock<HashMap<PlayerId, ConnectionId>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            player_to_connection: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_connection(
        &self,
        id: ConnectionId,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (conn, receiver) = Connection::new(id);

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, conn);
        }

        receiver
    }

    pub async fn remove_connection(&self, id: ConnectionId) {
        let player_id = {
            let mut connections = self.connections.write().await;
            connections.remove(&id).and_then(|conn| conn.player_id)
        };

        // Only drop the seat mapping if this connection still holds it. A
        // reconnect may have already taken the seat over.
        if let Some(player_id) = player_id {
            let mut player_to_connection = self.player_to_connection.write().await;
            if player_to_connection.get(&player_id) == Some(&id) {
                player_to_connection.remove(&player_id);
            }
        }
    }

    pub async fn get_connection(&self, id: ConnectionId) -> Option<Connection> {
        let connections = self.connections.read().await;
        connections.get(&id).cloned()
    }

    pub async fn get_connection_by_player(&self, player_id: &str) -> Option<Connection> {
        let player_to_connection = self.player_to_connection.read().await;
        if let Some(connection_id) = player_to_connection.get(player_id) {
            let connections = self.connections.read().await;
            connections.get(connection_id).cloned()
        } else {
            None
        }
    }

    /// Binds a connection to a player's seat in a room. If the player was
    /// already bound elsewhere the new connection wins and the old one is
    /// left anonymous.
    pub async fn bind_player(
        &self,
        id: ConnectionId,
        player_id: &str,
        room_id: &str,
        nickname: &str,
    ) -> Result<(), String> {
        let previous = {
            let mut player_to_connection = self.player_to_connection.write().await;
            player_to_connection.insert(player_id.to_string(), id)
        };

        let mut connections = self.connections.write().await;
        if let Some(old_id) = previous.filter(|old| *old != id) {
            if let Some(old) = connections.get_mut(&old_id) {
                old.unbind();
            }
        }
        if let Some(connection) = connections.get_mut(&id) {
            connection.bind(
                player_id.to_string(),
                room_id.to_string(),
                nickname.to_string(),
            );
            Ok(())
        } else {
            Err("Connection not found".to_string())
        }
    }

    /// Clears every binding into a room. Used when the room is destroyed so
    /// lingering sockets stop receiving a future room that reuses the code.
    pub async fn unbind_room(&self, room_id: &str) {
        let mut connections = self.connections.write().await;
        let mut player_to_connection = self.player_to_connection.write().await;
        for connection in connections.values_mut() {
            if connection.room_id.as_deref() == Some(room_id) {
                if let Some(player_id) = connection.player_id.take() {
                    if player_to_connection.get(&player_id) == Some(&connection.id) {
                        player_to_connection.remove(&player_id);
                    }
                }
                connection.room_id = None;
                connection.nickname = None;
            }
        }
    }

    pub async fn update_activity(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.update_activity();
        }
    }

    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), String> {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(&id) {
            connection.send_message(message)
        } else {
            Err("Connection not found".to_string())
        }
    }

    pub async fn send_to_player(
        &self,
        player_id: &str,
        message: ServerMessage,
    ) -> Result<(), String> {
        let connection_id = {
            let player_to_connection = self.player_to_connection.read().await;
            player_to_connection.get(player_id).copied()
        };

        if let Some(connection_id) = connection_id {
            self.send_to_connection(connection_id, message).await
        } else {
            Err("Player not connected".to_string())
        }
    }

    pub async fn send_to_room(&self, room_id: &str, message: ServerMessage) {
        let connections = self.connections.read().await;
        for connection in connections.values() {
            if connection.room_id.as_deref() == Some(room_id) {
                let _ = connection.send_message(message.clone());
            }
        }
    }

    /// Every connection bound into a room, with the seat it holds. Callers
    /// use this to send each viewer their own redacted snapshot.
    pub async fn room_recipients(&self, room_id: &str) -> Vec<(ConnectionId, Option<PlayerId>)> {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|conn| conn.room_id.as_deref() == Some(room_id))
            .map(|conn| (conn.id, conn.player_id.clone()))
            .collect()
    }

    /// Drops sockets that connected but never claimed a seat. Seated
    /// connections are left alone; their lifecycle runs through the close
    /// handler and the disconnect grace window.
    pub async fn cleanup_inactive_connections(&self, timeout: Duration) {
        let inactive_connections: Vec<ConnectionId> = {
            let connections = self.connections.read().await;
            connections
                .values()
                .filter(|conn| conn.player_id.is_none() && conn.is_inactive(timeout))
                .map(|conn| conn.id)
                .collect()
        };

        for connection_id in inactive_connections {
            tracing::info!("Removing inactive unbound connection: {}", connection_id);
            self.remove_connection(connection_id).await;
        }
    }

    // Test helper methods
    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }

    pub async fn bound_player_count(&self) -> usize {
        let player_connections = self.player_to_connection.read().await;
        player_connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
