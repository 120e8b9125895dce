use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use contact_server::websocket::{ConnectionId, ConnectionManager};
use contact_server::{Config, GameCoordinator};
use contact_store::MemoryStore;
use contact_types::room::{PlayerRole, RoomStatus};
use contact_types::ServerMessage;

/// One connected player: their seat ids plus the receiving end of their
/// socket, so tests can assert on what the server pushed to them.
pub struct Seat {
    pub player_id: String,
    pub connection_id: ConnectionId,
    pub receiver: UnboundedReceiver<ServerMessage>,
}

/// A room mid-game: wordmaster Wanda plus the given guessers, everyone
/// connected, round 1 waiting for its first clue.
pub struct GameFixture {
    pub room_id: String,
    pub game_id: String,
    pub wordmaster: Seat,
    pub guessers: Vec<Seat>,
}

pub struct TestSetup {
    pub coordinator: Arc<GameCoordinator>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self::with_grace_seconds(0)
    }

    pub fn with_grace_seconds(grace: u64) -> Self {
        let store = Arc::new(MemoryStore::with_max_players(6));
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_players_per_room: 6,
            default_round_time_minutes: 2,
            default_wordmaster_guess_limit: 3,
            disconnect_grace_seconds: grace,
            connection_timeout_seconds: 300,
            room_idle_minutes: 60,
        };
        Self {
            coordinator: Arc::new(GameCoordinator::new(
                store.clone(),
                store,
                Arc::new(ConnectionManager::new()),
                config,
            )),
        }
    }

    /// Opens a socket for a player who already holds a seat and binds it.
    pub async fn connect_player(&self, room_id: &str, player_id: &str, nickname: &str) -> Seat {
        let connection_id = ConnectionId::new();
        let receiver = self
            .coordinator
            .connections()
            .create_connection(connection_id)
            .await;
        self.coordinator
            .handle_join_room(connection_id, room_id, player_id, nickname)
            .await
            .unwrap();
        Seat {
            player_id: player_id.to_string(),
            connection_id,
            receiver,
        }
    }

    /// Room with every listed player seated and connected. The first entry
    /// creates the room and is its admin.
    pub async fn lobby_with_players(&self, players: &[(&str, &str)]) -> (String, Vec<Seat>) {
        let (admin_id, admin_nickname) = players[0];
        let room = self
            .coordinator
            .create_room(admin_id, admin_nickname)
            .await
            .unwrap();
        for (player_id, nickname) in &players[1..] {
            self.coordinator
                .join_room(&room.room_id, player_id, nickname)
                .await
                .unwrap();
        }

        let mut seats = Vec::new();
        for (player_id, nickname) in players {
            seats.push(self.connect_player(&room.room_id, player_id, nickname).await);
        }
        (room.room_id, seats)
    }

    /// Room in the `starting` phase: roles assigned, everyone readied up,
    /// wordmaster about to pick the word.
    pub async fn start_choosing(&self, guessers: &[(&str, &str)]) -> (String, Vec<Seat>) {
        let mut players = vec![("wm", "Wanda")];
        players.extend_from_slice(guessers);
        let (room_id, seats) = self.lobby_with_players(&players).await;

        self.coordinator
            .set_player_role(&room_id, "wm", Some(PlayerRole::Wordmaster))
            .await
            .unwrap();
        for (player_id, _) in guessers {
            self.coordinator
                .set_player_role(&room_id, player_id, Some(PlayerRole::Guesser))
                .await
                .unwrap();
        }
        for seat in &seats {
            self.coordinator
                .handle_player_ready(seat.connection_id, &room_id)
                .await
                .unwrap();
        }
        self.coordinator
            .set_room_status(&room_id, "wm", RoomStatus::Starting)
            .await
            .unwrap();
        (room_id, seats)
    }

    /// Full fixture: room in game with round 1 open and the first guesser in
    /// the list giving the clue.
    pub async fn start_game(&self, target_word: &str, guessers: &[(&str, &str)]) -> GameFixture {
        let (room_id, mut seats) = self.start_choosing(guessers).await;
        let game = self
            .coordinator
            .create_game(&room_id, "wm", target_word, "word")
            .await
            .unwrap();

        let wordmaster = seats.remove(0);
        GameFixture {
            room_id,
            game_id: game.game_id,
            wordmaster,
            guessers: seats,
        }
    }
}

/// Everything the server has pushed to this seat so far.
pub fn drain(receiver: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = receiver.try_recv() {
        messages.push(message);
    }
    messages
}

/// The session token from a drained `SessionEstablished`, if one arrived.
pub fn session_token(messages: &[ServerMessage]) -> Option<String> {
    messages.iter().find_map(|message| match message {
        ServerMessage::SessionEstablished { session_token, .. } => Some(session_token.clone()),
        _ => None,
    })
}
