use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use contact_core::{Game, StateError, TargetAttempt};
use contact_types::{
    GameId, GameLogEvent, Player, PlayerId, PlayerRole, Room, RoomId, RoomSettings, RoomStatus,
};

use crate::error::{StoreError, StoreResult};
use crate::traits::{GameStore, RoomStore};

pub const DEFAULT_MAX_PLAYERS: usize = 6;

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ROOM_CODE_LENGTH: usize = 6;

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn random_room_code() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(ROOM_CODE_LENGTH)
        .map(|b| ROOM_CODE_ALPHABET[*b as usize % ROOM_CODE_ALPHABET.len()] as char)
        .collect()
}

/// In-process store holding every room and game behind async locks. Room and
/// game maps lock independently; cross-entity sequencing is the
/// coordinator's job.
pub struct MemoryStore {
    rooms: RwLock<HashMap<RoomId, Room>>,
    games: RwLock<HashMap<GameId, Game>>,
    max_players: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_max_players(DEFAULT_MAX_PLAYERS)
    }

    pub fn with_max_players(max_players: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            games: RwLock::new(HashMap::new()),
            max_players,
        }
    }

    async fn mutate_room(
        &self,
        room_id: &str,
        f: impl FnOnce(&mut Room) -> StoreResult<()> + Send,
    ) -> StoreResult<Room> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))?;
        f(room)?;
        room.updated_at = now();
        Ok(room.clone())
    }

    async fn mutate_game<T>(
        &self,
        game_id: &str,
        f: impl FnOnce(&mut Game) -> Result<T, StateError> + Send,
    ) -> StoreResult<(Game, T)> {
        let mut games = self.games.write().await;
        let game = games
            .get_mut(game_id)
            .ok_or_else(|| StoreError::GameNotFound(game_id.to_string()))?;
        let value = f(game)?;
        Ok((game.clone(), value))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn create_room(
        &self,
        admin_id: &str,
        admin_nickname: &str,
        settings: RoomSettings,
    ) -> StoreResult<Room> {
        let mut rooms = self.rooms.write().await;
        let room_id = loop {
            let code = random_room_code();
            if !rooms.contains_key(&code) {
                break code;
            }
        };
        let room = Room {
            room_id: room_id.clone(),
            admin_id: admin_id.to_string(),
            players: vec![Player {
                player_id: admin_id.to_string(),
                nickname: admin_nickname.trim().to_string(),
                role: None,
                is_ready: false,
                joined_at: now(),
            }],
            settings,
            status: RoomStatus::Waiting,
            created_at: now(),
            updated_at: now(),
        };
        rooms.insert(room_id.clone(), room.clone());
        debug!(room_id = %room_id, admin_id, "room created");
        Ok(room)
    }

    async fn find_room(&self, room_id: &str) -> StoreResult<Option<Room>> {
        Ok(self.rooms.read().await.get(room_id).cloned())
    }

    async fn list_rooms(&self) -> StoreResult<Vec<Room>> {
        Ok(self.rooms.read().await.values().cloned().collect())
    }

    async fn add_player(
        &self,
        room_id: &str,
        player_id: &str,
        nickname: &str,
    ) -> StoreResult<Room> {
        let max_players = self.max_players;
        self.mutate_room(room_id, |room| {
            if let Some(player) = room.player_mut(player_id) {
                // Rejoin of a seated player counts as confirming readiness.
                player.is_ready = true;
                return Ok(());
            }
            if matches!(room.status, RoomStatus::Starting | RoomStatus::InGame) {
                return Err(StoreError::conflict("a game is in progress"));
            }
            if room.players.len() >= max_players {
                return Err(StoreError::conflict("room is full"));
            }
            room.players.push(Player {
                player_id: player_id.to_string(),
                nickname: nickname.trim().to_string(),
                role: None,
                is_ready: false,
                joined_at: now(),
            });
            Ok(())
        })
        .await
    }

    async fn remove_player(&self, room_id: &str, player_id: &str) -> StoreResult<Option<Room>> {
        let mut rooms = self.rooms.write().await;
        let (destroyed, snapshot) = {
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))?;
            let before = room.players.len();
            room.players.retain(|p| p.player_id != player_id);
            if room.players.len() == before {
                return Err(StoreError::PlayerNotFound(player_id.to_string()));
            }
            if room.players.is_empty() {
                (true, None)
            } else {
                if room.admin_id == player_id {
                    room.admin_id = room.players[0].player_id.clone();
                }
                room.updated_at = now();
                (false, Some(room.clone()))
            }
        };
        if destroyed {
            rooms.remove(room_id);
            debug!(room_id, "room destroyed, last player left");
        }
        Ok(snapshot)
    }

    async fn set_player_ready(
        &self,
        room_id: &str,
        player_id: &str,
        is_ready: bool,
    ) -> StoreResult<Room> {
        self.mutate_room(room_id, |room| {
            let player = room
                .player_mut(player_id)
                .ok_or_else(|| StoreError::PlayerNotFound(player_id.to_string()))?;
            player.is_ready = is_ready;
            Ok(())
        })
        .await
    }

    async fn set_player_role(
        &self,
        room_id: &str,
        player_id: &str,
        role: Option<PlayerRole>,
    ) -> StoreResult<Room> {
        self.mutate_room(room_id, |room| {
            if room.status != RoomStatus::Waiting {
                return Err(StoreError::conflict(
                    "roles can only change while the room is waiting",
                ));
            }
            if role == Some(PlayerRole::Wordmaster)
                && room
                    .players
                    .iter()
                    .any(|p| p.role == Some(PlayerRole::Wordmaster) && p.player_id != player_id)
            {
                return Err(StoreError::conflict("the room already has a wordmaster"));
            }
            let player = room
                .player_mut(player_id)
                .ok_or_else(|| StoreError::PlayerNotFound(player_id.to_string()))?;
            player.role = role;
            Ok(())
        })
        .await
    }

    async fn update_settings(&self, room_id: &str, settings: RoomSettings) -> StoreResult<Room> {
        self.mutate_room(room_id, |room| {
            room.settings = settings;
            Ok(())
        })
        .await
    }

    async fn update_status(&self, room_id: &str, status: RoomStatus) -> StoreResult<Room> {
        self.mutate_room(room_id, |room| {
            if status == RoomStatus::Starting {
                // Everyone re-confirms before the word is chosen.
                for player in &mut room.players {
                    player.is_ready = false;
                }
            }
            room.status = status;
            Ok(())
        })
        .await
    }

    async fn delete_room(&self, room_id: &str) -> StoreResult<bool> {
        let removed = self.rooms.write().await.remove(room_id).is_some();
        if removed {
            debug!(room_id, "room deleted");
        }
        Ok(removed)
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn create_game(
        &self,
        room: &Room,
        wordmaster_id: &str,
        target_word: &str,
        word_type: &str,
    ) -> StoreResult<Game> {
        let mut games = self.games.write().await;
        if games
            .values()
            .any(|g| g.room_id == room.room_id && g.is_active())
        {
            return Err(StoreError::conflict("the room already has an active game"));
        }
        let game_id = format!("game_{}", Uuid::new_v4());
        let mut game = Game::new(game_id, room, wordmaster_id, target_word, word_type)?;

        let first_giver = game
            .next_clue_giver()
            .ok_or(StoreError::State(StateError::NotEnoughGuessers))?;
        game.start_round(&first_giver, room.settings.wordmaster_guess_limit)?;
        let giver_nickname = room
            .player(&first_giver)
            .map(|p| p.nickname.clone())
            .unwrap_or_else(|| first_giver.clone());
        game.push_log(
            GameLogEvent::RoundStarted,
            format!("Round 1 started. {} is the clue-giver.", giver_nickname),
        );

        games.insert(game.game_id.clone(), game.clone());
        debug!(game_id = %game.game_id, room_id = %room.room_id, "game created");
        Ok(game)
    }

    async fn find_game(&self, game_id: &str) -> StoreResult<Option<Game>> {
        Ok(self.games.read().await.get(game_id).cloned())
    }

    async fn find_room_games(&self, room_id: &str) -> StoreResult<Vec<Game>> {
        let games = self.games.read().await;
        let mut games: Vec<Game> = games
            .values()
            .filter(|g| g.room_id == room_id)
            .cloned()
            .collect();
        games.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(games)
    }

    async fn find_active_game(&self, room_id: &str) -> StoreResult<Option<Game>> {
        Ok(self
            .games
            .read()
            .await
            .values()
            .find(|g| g.room_id == room_id && g.is_active())
            .cloned())
    }

    async fn start_round(
        &self,
        game_id: &str,
        clue_giver_id: &str,
        wordmaster_guess_limit: u32,
    ) -> StoreResult<Game> {
        let (game, _) = self
            .mutate_game(game_id, |game| {
                game.start_round(clue_giver_id, wordmaster_guess_limit)
            })
            .await?;
        Ok(game)
    }

    async fn submit_clue(
        &self,
        game_id: &str,
        round_number: u32,
        player_id: &str,
        clue_word: &str,
        clue: &str,
    ) -> StoreResult<Game> {
        let (game, _) = self
            .mutate_game(game_id, |game| {
                game.submit_clue(round_number, player_id, clue_word, clue)
            })
            .await?;
        Ok(game)
    }

    async fn submit_second_clue(
        &self,
        game_id: &str,
        round_number: u32,
        player_id: &str,
        clue: &str,
    ) -> StoreResult<Game> {
        let (game, _) = self
            .mutate_game(game_id, |game| {
                game.submit_second_clue(round_number, player_id, clue)
            })
            .await?;
        Ok(game)
    }

    async fn upsert_contact(
        &self,
        game_id: &str,
        round_number: u32,
        player_id: &str,
        word: &str,
    ) -> StoreResult<Game> {
        let (game, _) = self
            .mutate_game(game_id, |game| {
                game.upsert_contact(round_number, player_id, word)
            })
            .await?;
        Ok(game)
    }

    async fn remove_contact(
        &self,
        game_id: &str,
        round_number: u32,
        player_id: &str,
    ) -> StoreResult<Game> {
        let (game, _) = self
            .mutate_game(game_id, |game| game.remove_contact(round_number, player_id))
            .await?;
        Ok(game)
    }

    async fn add_wordmaster_guess(
        &self,
        game_id: &str,
        round_number: u32,
        player_id: &str,
        guess: &str,
    ) -> StoreResult<(Game, bool)> {
        self.mutate_game(game_id, |game| {
            game.add_wordmaster_guess(round_number, player_id, guess)
        })
        .await
    }

    async fn record_target_attempt(
        &self,
        game_id: &str,
        player_id: &str,
        guess: &str,
    ) -> StoreResult<(Game, TargetAttempt)> {
        self.mutate_game(game_id, |game| game.record_target_attempt(player_id, guess))
            .await
    }

    async fn add_points(&self, game_id: &str, player_id: &str, points: i32) -> StoreResult<Game> {
        let (game, _) = self
            .mutate_game(game_id, |game| {
                game.add_points(player_id, points);
                Ok(())
            })
            .await?;
        Ok(game)
    }

    async fn remove_guesser(&self, game_id: &str, player_id: &str) -> StoreResult<Game> {
        let (game, _) = self
            .mutate_game(game_id, |game| {
                game.remove_guesser(player_id);
                Ok(())
            })
            .await?;
        Ok(game)
    }

    async fn end_round(
        &self,
        game_id: &str,
        round_number: u32,
        contact_successful: bool,
        new_letter: Option<char>,
    ) -> StoreResult<Game> {
        let (game, _) = self
            .mutate_game(game_id, |game| {
                game.end_round(round_number, contact_successful, new_letter)
            })
            .await?;
        Ok(game)
    }

    async fn append_log(
        &self,
        game_id: &str,
        event: GameLogEvent,
        message: &str,
    ) -> StoreResult<Game> {
        let (game, _) = self
            .mutate_game(game_id, |game| {
                game.push_log(event, message);
                Ok(())
            })
            .await?;
        Ok(game)
    }

    async fn complete_game(&self, game_id: &str, winner_id: Option<PlayerId>) -> StoreResult<Game> {
        let (game, _) = self
            .mutate_game(game_id, |game| game.complete(winner_id))
            .await?;
        Ok(game)
    }

    async fn delete_room_games(&self, room_id: &str) -> StoreResult<()> {
        self.games.write().await.retain(|_, g| g.room_id != room_id);
        Ok(())
    }
}
