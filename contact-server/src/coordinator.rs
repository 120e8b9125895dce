use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use contact_core::{Game, RoundOutcome, ScoringEngine, judge_round, matching};
use contact_store::{GameStore, RoomStore};
use contact_types::{
    GameId, GameLogEvent, GameView, PlayerId, PlayerRole, RevealedContact, Room, RoomId,
    RoomStatus, ServerMessage,
};

use crate::config::Config;
use crate::errors::{CoordinatorError, CoordinatorResult};
use crate::session::SessionRegistry;
use crate::websocket::connection::{ConnectionId, ConnectionManager};

/// Owns every room's lifecycle: lobby membership, game creation, round
/// resolution, timers and disconnect grace periods. All mutations of one
/// room happen under that room's lock, so a timer firing and a wordmaster
/// block can never both close the same round.
pub struct GameCoordinator {
    rooms: Arc<dyn RoomStore>,
    games: Arc<dyn GameStore>,
    connections: Arc<ConnectionManager>,
    sessions: SessionRegistry,
    config: Config,
    room_locks: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
    round_timers: Mutex<HashMap<(GameId, u32), JoinHandle<()>>>,
    grace_timers: Mutex<HashMap<PlayerId, JoinHandle<()>>>,
}

impl GameCoordinator {
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        games: Arc<dyn GameStore>,
        connections: Arc<ConnectionManager>,
        config: Config,
    ) -> Self {
        Self {
            rooms,
            games,
            connections,
            sessions: SessionRegistry::new(),
            config,
            room_locks: Mutex::new(HashMap::new()),
            round_timers: Mutex::new(HashMap::new()),
            grace_timers: Mutex::new(HashMap::new()),
        }
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ===== Room lifecycle (REST) =====

    pub async fn create_room(&self, admin_id: &str, admin_nickname: &str) -> CoordinatorResult<Room> {
        let admin_id = admin_id.trim();
        let admin_nickname = admin_nickname.trim();
        if admin_id.is_empty() || admin_nickname.is_empty() {
            return Err(CoordinatorError::validation(
                "A player id and nickname are required",
            ));
        }

        let room = self
            .rooms
            .create_room(admin_id, admin_nickname, self.config.default_room_settings())
            .await?;
        info!("Room {} created by {}", room.room_id, admin_nickname);
        Ok(room)
    }

    pub async fn get_room(&self, room_id: &str) -> CoordinatorResult<Room> {
        self.require_room(room_id).await
    }

    pub async fn join_room(
        &self,
        room_id: &str,
        player_id: &str,
        nickname: &str,
    ) -> CoordinatorResult<Room> {
        let player_id = player_id.trim();
        let nickname = nickname.trim();
        if player_id.is_empty() || nickname.is_empty() {
            return Err(CoordinatorError::validation(
                "A player id and nickname are required",
            ));
        }

        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let room = self.rooms.add_player(room_id, player_id, nickname).await?;
        self.broadcast_room_state(&room).await;
        info!("Player {} joined room {}", nickname, room_id);
        Ok(room)
    }

    /// Removes a seat. Players remove themselves; the admin may remove
    /// anyone. Returns `None` when the last seat emptied and the room was
    /// destroyed.
    pub async fn leave_room(
        &self,
        room_id: &str,
        target_id: &str,
        requester_id: &str,
    ) -> CoordinatorResult<Option<Room>> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let room = self.require_room(room_id).await?;
        if requester_id != target_id && !room.is_admin(requester_id) {
            return Err(CoordinatorError::forbidden(
                "Only the admin can remove other players",
            ));
        }
        if room.status == RoomStatus::InGame {
            return Err(CoordinatorError::validation(
                "Players cannot be removed during a game",
            ));
        }
        let nickname = Self::nickname_of(&room, target_id);
        let kicked = requester_id != target_id;

        let updated = self.rooms.remove_player(room_id, target_id).await?;
        self.sessions.forget_player(target_id).await;
        self.cancel_grace_timer(target_id).await;

        match updated {
            Some(room) => {
                let notice = if kicked {
                    ServerMessage::PlayerKicked {
                        player_id: target_id.to_string(),
                        nickname,
                    }
                } else {
                    ServerMessage::PlayerLeft {
                        player_id: target_id.to_string(),
                        nickname,
                    }
                };
                self.connections.send_to_room(room_id, notice).await;
                self.broadcast_room_state(&room).await;
                Ok(Some(room))
            }
            None => {
                self.purge_room(room_id).await?;
                Ok(None)
            }
        }
    }

    pub async fn update_settings(
        &self,
        room_id: &str,
        requester_id: &str,
        round_time_minutes: Option<u32>,
        wordmaster_guess_limit: Option<u32>,
    ) -> CoordinatorResult<Room> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let room = self.require_room(room_id).await?;
        if !room.is_admin(requester_id) {
            return Err(CoordinatorError::forbidden(
                "Only the admin can change settings",
            ));
        }

        let mut settings = room.settings.clone();
        if let Some(minutes) = round_time_minutes {
            if minutes < 1 {
                return Err(CoordinatorError::validation(
                    "Round time must be at least one minute",
                ));
            }
            settings.round_time_minutes = minutes;
        }
        if let Some(limit) = wordmaster_guess_limit {
            if limit < 1 {
                return Err(CoordinatorError::validation(
                    "The wordmaster needs at least one guess per round",
                ));
            }
            settings.wordmaster_guess_limit = limit;
        }

        let room = self.rooms.update_settings(room_id, settings).await?;
        self.broadcast_room_state(&room).await;
        Ok(room)
    }

    pub async fn set_player_role(
        &self,
        room_id: &str,
        player_id: &str,
        role: Option<PlayerRole>,
    ) -> CoordinatorResult<Room> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let room = self.rooms.set_player_role(room_id, player_id, role).await?;
        self.broadcast_room_state(&room).await;
        Ok(room)
    }

    /// Admin-driven status changes. Only `waiting` and `starting` can be
    /// requested; the game lifecycle itself moves rooms to `in-game` and
    /// `completed`.
    pub async fn set_room_status(
        &self,
        room_id: &str,
        requester_id: &str,
        status: RoomStatus,
    ) -> CoordinatorResult<Room> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let room = self.require_room(room_id).await?;
        if !room.is_admin(requester_id) {
            return Err(CoordinatorError::forbidden(
                "Only the admin can change the room status",
            ));
        }

        match status {
            RoomStatus::Waiting => {
                if room.status == RoomStatus::InGame {
                    return Err(CoordinatorError::validation(
                        "Finish the game before returning to the lobby",
                    ));
                }
                let room = self.rooms.update_status(room_id, RoomStatus::Waiting).await?;
                self.broadcast_room_state(&room).await;
                Ok(room)
            }
            RoomStatus::Starting => {
                if room.status != RoomStatus::Waiting {
                    return Err(CoordinatorError::validation(
                        "The room is not waiting to start",
                    ));
                }
                if !room.all_roles_assigned() {
                    return Err(CoordinatorError::validation(
                        "Every player needs a role before starting",
                    ));
                }
                let wordmaster = room.wordmaster().ok_or_else(|| {
                    CoordinatorError::validation("The room needs a wordmaster")
                })?;
                let wordmaster_id = wordmaster.player_id.clone();
                let wordmaster_nickname = wordmaster.nickname.clone();
                if room.guessers().len() < 2 {
                    return Err(CoordinatorError::validation(
                        "At least two guessers are required",
                    ));
                }
                if !room.all_ready() {
                    return Err(CoordinatorError::validation("Every player must be ready"));
                }

                let room = self
                    .rooms
                    .update_status(room_id, RoomStatus::Starting)
                    .await?;
                self.broadcast_room_state(&room).await;
                self.connections
                    .send_to_room(
                        room_id,
                        ServerMessage::WordmasterChoosing {
                            wordmaster_id: wordmaster_id.clone(),
                            nickname: wordmaster_nickname,
                        },
                    )
                    .await;
                let _ = self
                    .connections
                    .send_to_player(&wordmaster_id, ServerMessage::ShowTargetWordModal)
                    .await;
                Ok(room)
            }
            RoomStatus::InGame | RoomStatus::Completed => Err(CoordinatorError::validation(
                "The game lifecycle manages that status",
            )),
        }
    }

    pub async fn delete_room(&self, room_id: &str, requester_id: &str) -> CoordinatorResult<()> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let room = self.require_room(room_id).await?;
        if !room.is_admin(requester_id) {
            return Err(CoordinatorError::forbidden(
                "Only the admin can close the room",
            ));
        }

        self.rooms.delete_room(room_id).await?;
        self.connections
            .send_to_room(
                room_id,
                ServerMessage::RoomClosed {
                    room_id: room_id.to_string(),
                },
            )
            .await;
        self.purge_room(room_id).await?;
        Ok(())
    }

    // ===== Game lifecycle (REST) =====

    /// The wordmaster's word choice. Creates the game with round 1 open and
    /// moves the room to `in-game`.
    pub async fn create_game(
        &self,
        room_id: &str,
        requester_id: &str,
        target_word: &str,
        word_type: &str,
    ) -> CoordinatorResult<Game> {
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let room = self.require_room(room_id).await?;
        if room.status != RoomStatus::Starting {
            return Err(CoordinatorError::validation(
                "The room is not picking a word",
            ));
        }
        let wordmaster = room
            .wordmaster()
            .ok_or_else(|| CoordinatorError::validation("The room needs a wordmaster"))?;
        if wordmaster.player_id != requester_id {
            return Err(CoordinatorError::forbidden(
                "Only the wordmaster can choose the target word",
            ));
        }

        let word_type = word_type.trim();
        let word_type = if word_type.is_empty() { "word" } else { word_type };
        let game = self
            .games
            .create_game(&room, requester_id, target_word, word_type)
            .await?;

        let room = self.rooms.update_status(room_id, RoomStatus::InGame).await?;
        self.broadcast_room_state(&room).await;
        self.broadcast_game(&game, |game| ServerMessage::GameStarted { game })
            .await;
        info!(
            "Game {} started in room {} with a {}-letter word",
            game.game_id,
            room.room_id,
            game.target_word.len()
        );
        Ok(game)
    }

    pub async fn get_game(&self, game_id: &str) -> CoordinatorResult<Game> {
        self.games
            .find_game(game_id)
            .await?
            .ok_or_else(|| CoordinatorError::not_found(format!("Game {} not found", game_id)))
    }

    pub async fn room_games(&self, room_id: &str) -> CoordinatorResult<Vec<Game>> {
        Ok(self.games.find_room_games(room_id).await?)
    }

    pub async fn active_game(&self, room_id: &str) -> CoordinatorResult<Option<Game>> {
        Ok(self.games.find_active_game(room_id).await?)
    }

    // ===== Socket operations =====

    /// Binds a connection to a seat the player already holds. Issues the
    /// session token the client uses to resume after a drop.
    pub async fn handle_join_room(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
        player_id: &str,
        nickname: &str,
    ) -> CoordinatorResult<()> {
        let player_id = player_id.trim();
        if player_id.is_empty() || nickname.trim().is_empty() {
            return Err(CoordinatorError::validation(
                "A player id and nickname are required",
            ));
        }

        let room = self.require_room(room_id).await?;
        if !room.is_member(player_id) {
            return Err(CoordinatorError::validation(
                "Join the room through the lobby first",
            ));
        }
        // The seat's registered nickname wins over whatever the socket sent.
        let nickname = Self::nickname_of(&room, player_id);

        let reconnected = self.cancel_grace_timer(player_id).await;
        self.connections
            .bind_player(connection_id, player_id, room_id, &nickname)
            .await
            .map_err(CoordinatorError::validation)?;

        let token = self.sessions.issue(player_id, room_id, &nickname).await;
        let _ = self
            .connections
            .send_to_connection(
                connection_id,
                ServerMessage::SessionEstablished {
                    session_token: token,
                    player_id: player_id.to_string(),
                    room_id: room_id.to_string(),
                    nickname: nickname.clone(),
                },
            )
            .await;
        self.broadcast_room_state(&room).await;

        if reconnected {
            debug!("Player {} rebound to room {} within grace", player_id, room_id);
        }
        Ok(())
    }

    /// Rebinds a dropped connection from its session token. The seat must
    /// still exist; tokens for vanished rooms or seats stop resolving.
    pub async fn handle_resume_session(
        &self,
        connection_id: ConnectionId,
        token: &str,
    ) -> CoordinatorResult<()> {
        let record = self
            .sessions
            .resolve(token)
            .await
            .ok_or_else(|| CoordinatorError::not_found("Session expired"))?;

        let room = match self.rooms.find_room(&record.room_id).await? {
            Some(room) if room.is_member(&record.player_id) => room,
            _ => {
                self.sessions.forget(token).await;
                return Err(CoordinatorError::not_found("Your seat is no longer there"));
            }
        };

        self.cancel_grace_timer(&record.player_id).await;
        self.connections
            .bind_player(connection_id, &record.player_id, &record.room_id, &record.nickname)
            .await
            .map_err(CoordinatorError::validation)?;

        let _ = self
            .connections
            .send_to_connection(
                connection_id,
                ServerMessage::SessionEstablished {
                    session_token: token.to_string(),
                    player_id: record.player_id.clone(),
                    room_id: record.room_id.clone(),
                    nickname: record.nickname.clone(),
                },
            )
            .await;
        self.connections
            .send_to_room(
                &record.room_id,
                ServerMessage::PlayerReconnected {
                    player_id: record.player_id.clone(),
                    nickname: record.nickname.clone(),
                },
            )
            .await;
        let _ = self
            .connections
            .send_to_connection(connection_id, ServerMessage::RoomUpdated { room })
            .await;
        info!(
            "Player {} resumed their session in room {}",
            record.player_id, record.room_id
        );
        Ok(())
    }

    pub async fn handle_player_ready(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
    ) -> CoordinatorResult<()> {
        let (player_id, bound_room, _) = self.actor(connection_id).await?;
        if bound_room != room_id {
            return Err(CoordinatorError::validation("You are not in that room"));
        }

        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let room = self.rooms.set_player_ready(room_id, &player_id, true).await?;
        self.broadcast_room_state(&room).await;
        Ok(())
    }

    /// First clue opens the round timer; a second clue rides the one already
    /// running.
    pub async fn handle_submit_clue(
        self: &Arc<Self>,
        connection_id: ConnectionId,
        game_id: &str,
        room_id: &str,
        round_number: u32,
        clue_word: Option<&str>,
        clue: &str,
        is_second_clue: bool,
    ) -> CoordinatorResult<()> {
        let (player_id, bound_room, nickname) = self.actor(connection_id).await?;
        if bound_room != room_id {
            return Err(CoordinatorError::validation("You are not in that room"));
        }
        let clue = clue.trim();
        if clue.is_empty() {
            return Err(CoordinatorError::validation("A clue is required"));
        }

        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let room = self.require_room(room_id).await?;
        self.require_game(game_id, room_id).await?;

        if is_second_clue {
            self.games
                .submit_second_clue(game_id, round_number, &player_id, clue)
                .await?;
            let message = format!("{} gave a second clue: \"{}\"", nickname, clue);
            let game = self
                .games
                .append_log(game_id, GameLogEvent::SecondClueSubmitted, &message)
                .await?;
            let clue = clue.to_string();
            self.broadcast_game(&game, |game| ServerMessage::ClueSubmitted {
                game,
                round_number,
                clue: clue.clone(),
                is_second_clue: true,
            })
            .await;
            return Ok(());
        }

        let clue_word = clue_word
            .map(str::trim)
            .filter(|word| !word.is_empty())
            .ok_or_else(|| CoordinatorError::validation("A clue word is required"))?;

        let game = self
            .games
            .submit_clue(game_id, round_number, &player_id, clue_word, clue)
            .await?;
        let message = format!(
            "{} gave a clue: \"{}\" (clue word starts with {})",
            nickname,
            clue,
            game.revealed_prefix()
        );
        let game = self
            .games
            .append_log(game_id, GameLogEvent::ClueSubmitted, &message)
            .await?;
        let clue_owned = clue.to_string();
        self.broadcast_game(&game, |game| ServerMessage::ClueSubmitted {
            game,
            round_number,
            clue: clue_owned.clone(),
            is_second_clue: false,
        })
        .await;

        let duration = Duration::from_secs(u64::from(room.settings.round_time_minutes) * 60);
        self.schedule_round_timer(game_id, round_number, duration).await;
        self.connections
            .send_to_room(
                room_id,
                ServerMessage::RoundTimerStarted {
                    game_id: game_id.to_string(),
                    round_number,
                    duration_ms: duration.as_millis() as u64,
                    started_at: Utc::now().to_rfc3339(),
                },
            )
            .await;
        Ok(())
    }

    pub async fn handle_contact_click(
        &self,
        connection_id: ConnectionId,
        game_id: &str,
        room_id: &str,
        round_number: u32,
        word: &str,
    ) -> CoordinatorResult<()> {
        self.record_contact(connection_id, game_id, room_id, round_number, word, false)
            .await
    }

    pub async fn handle_update_contact(
        &self,
        connection_id: ConnectionId,
        game_id: &str,
        room_id: &str,
        round_number: u32,
        word: &str,
    ) -> CoordinatorResult<()> {
        self.record_contact(connection_id, game_id, room_id, round_number, word, true)
            .await
    }

    pub async fn handle_remove_contact(
        &self,
        connection_id: ConnectionId,
        game_id: &str,
        room_id: &str,
        round_number: u32,
    ) -> CoordinatorResult<()> {
        let (player_id, bound_room, nickname) = self.actor(connection_id).await?;
        if bound_room != room_id {
            return Err(CoordinatorError::validation("You are not in that room"));
        }

        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        self.require_game(game_id, room_id).await?;
        self.games
            .remove_contact(game_id, round_number, &player_id)
            .await?;
        let message = format!("{} removed their contact", nickname);
        let game = self
            .games
            .append_log(game_id, GameLogEvent::ContactRemoved, &message)
            .await?;
        self.broadcast_game(&game, |game| ServerMessage::ContactUpdated {
            game,
            player_id: player_id.clone(),
        })
        .await;
        Ok(())
    }

    /// A correct guess blocks the clue word, pays the wordmaster and closes
    /// the round on the spot instead of waiting for the timer.
    pub async fn handle_wordmaster_guess(
        &self,
        connection_id: ConnectionId,
        game_id: &str,
        room_id: &str,
        round_number: u32,
        guess: &str,
    ) -> CoordinatorResult<()> {
        let (player_id, bound_room, _) = self.actor(connection_id).await?;
        if bound_room != room_id {
            return Err(CoordinatorError::validation("You are not in that room"));
        }
        let guess = guess.trim();
        if guess.is_empty() {
            return Err(CoordinatorError::validation("A guess is required"));
        }

        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        let room = self.require_room(room_id).await?;
        self.require_game(game_id, room_id).await?;

        let (game, correct) = self
            .games
            .add_wordmaster_guess(game_id, round_number, &player_id, guess)
            .await?;
        if correct {
            self.games
                .add_points(game_id, &player_id, ScoringEngine::WORDMASTER_BLOCK_POINTS)
                .await?;
        }

        let wordmaster_nickname = Self::nickname_of(&room, &game.wordmaster_id);
        let remaining = game
            .round(round_number)
            .map(|r| r.wordmaster_guesses_remaining)
            .unwrap_or(0);
        let message = if correct {
            format!(
                "Wordmaster {} guessed \"{}\" - CORRECT! Clue word was blocked.",
                wordmaster_nickname, guess
            )
        } else {
            format!(
                "Wordmaster {} guessed \"{}\" - Incorrect. {} guesses remaining.",
                wordmaster_nickname, guess, remaining
            )
        };
        let game = self
            .games
            .append_log(game_id, GameLogEvent::WordmasterGuess, &message)
            .await?;

        let guess_owned = guess.to_string();
        self.broadcast_game(&game, |game| ServerMessage::WordmasterGuessed {
            game,
            round_number,
            guess: guess_owned.clone(),
            correct,
        })
        .await;

        if correct {
            self.cancel_round_timer(game_id, round_number).await;
            self.resolve_round_locked(&room, game_id, round_number).await?;
        }
        Ok(())
    }

    /// One shot per revealed letter. Correct ends the game immediately;
    /// incorrect is reported only to the guesser who spent the attempt.
    pub async fn handle_target_word_guess(
        &self,
        connection_id: ConnectionId,
        game_id: &str,
        room_id: &str,
        guess: &str,
    ) -> CoordinatorResult<()> {
        let (player_id, bound_room, nickname) = self.actor(connection_id).await?;
        if bound_room != room_id {
            return Err(CoordinatorError::validation("You are not in that room"));
        }
        let guess = guess.trim();
        if guess.is_empty() {
            return Err(CoordinatorError::validation("A guess is required"));
        }

        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        self.require_game(game_id, room_id).await?;
        let (game, attempt) = self
            .games
            .record_target_attempt(game_id, &player_id, guess)
            .await?;

        if attempt.correct {
            let message = format!(
                "{} guessed the target word \"{}\" - CORRECT! Game over!",
                nickname, game.target_word
            );
            self.games
                .append_log(game_id, GameLogEvent::TargetWordGuess, &message)
                .await?;

            let points = ScoringEngine::target_word_award(
                game.revealed_letters.len(),
                attempt.first_attempt_of_game,
            );
            self.games.add_points(game_id, &player_id, points).await?;
            self.cancel_game_timers(game_id).await;
            let game = self
                .games
                .complete_game(game_id, Some(player_id.clone()))
                .await?;
            let message = format!(
                "Game completed! {} wins with {} points!",
                nickname,
                game.score(&player_id)
            );
            let game = self
                .games
                .append_log(game_id, GameLogEvent::GameCompleted, &message)
                .await?;

            let room = self
                .rooms
                .update_status(room_id, RoomStatus::Completed)
                .await?;
            self.broadcast_room_state(&room).await;
            let winner = player_id.clone();
            self.broadcast_game(&game, |game| ServerMessage::GameCompleted {
                game,
                winner_id: Some(winner.clone()),
            })
            .await;
        } else {
            let message = format!("{} made an incorrect target word guess", nickname);
            let game = self
                .games
                .append_log(game_id, GameLogEvent::TargetWordGuess, &message)
                .await?;
            let view = game.view_for(Some(&player_id));
            let _ = self
                .connections
                .send_to_connection(
                    connection_id,
                    ServerMessage::TargetWordGuessResult {
                        game: view,
                        correct: false,
                    },
                )
                .await;
        }
        Ok(())
    }

    // ===== Timers and disconnects =====

    /// Round timer expiry. Re-checks the round under the room lock; if a
    /// block already resolved it this is a no-op.
    pub async fn handle_round_timeout(&self, game_id: &str, round_number: u32) {
        self.round_timers
            .lock()
            .await
            .remove(&(game_id.to_string(), round_number));

        let room_id = match self.games.find_game(game_id).await {
            Ok(Some(game)) => game.room_id.clone(),
            _ => return,
        };
        let lock = self.room_lock(&room_id).await;
        let _guard = lock.lock().await;

        let room = match self.rooms.find_room(&room_id).await {
            Ok(Some(room)) => room,
            _ => return,
        };
        if let Err(e) = self.resolve_round_locked(&room, game_id, round_number).await {
            error!(
                "Failed to resolve round {} of game {}: {}",
                round_number, game_id, e
            );
        }
    }

    /// A socket dropped. If it still holds a seat, start the grace timer;
    /// the seat only suffers consequences if nobody reclaims it in time.
    pub async fn handle_socket_disconnect(self: &Arc<Self>, connection_id: ConnectionId) {
        let Some(connection) = self.connections.get_connection(connection_id).await else {
            return;
        };
        let (Some(player_id), Some(room_id)) = (connection.player_id, connection.room_id) else {
            return;
        };

        // A reconnect may already hold the seat, making this drop stale.
        if let Some(current) = self.connections.get_connection_by_player(&player_id).await {
            if current.id != connection_id {
                return;
            }
        }

        info!(
            "Player {} disconnected from room {}, grace period started",
            player_id, room_id
        );
        self.schedule_grace_timer(&player_id, &room_id).await;
    }

    /// Grace expired without a reconnect. What happens to the seat depends
    /// on where the room is in its lifecycle.
    async fn handle_grace_expired(&self, player_id: &str, room_id: &str) {
        self.grace_timers.lock().await.remove(player_id);

        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        // The player squeaked back in while the timer was firing.
        if self
            .connections
            .get_connection_by_player(player_id)
            .await
            .is_some()
        {
            return;
        }

        if let Err(e) = self.finalize_disconnect(player_id, room_id).await {
            error!(
                "Failed to finalize disconnect of {} from {}: {}",
                player_id, room_id, e
            );
        }
    }

    async fn finalize_disconnect(&self, player_id: &str, room_id: &str) -> CoordinatorResult<()> {
        let Some(room) = self.rooms.find_room(room_id).await? else {
            return Ok(());
        };
        let Some(player) = room.player(player_id) else {
            return Ok(());
        };
        let nickname = player.nickname.clone();
        warn!("Player {} lost their connection to room {}", nickname, room_id);

        if room.status == RoomStatus::InGame {
            if let Some(game) = self.games.find_active_game(room_id).await? {
                // The seat stays; the session survives so they can rejoin
                // and watch the rest of the game.
                return self
                    .handle_disconnect_during_game(&room, game, player_id, &nickname)
                    .await;
            }
        }

        if room.status == RoomStatus::Starting {
            let is_wordmaster = room
                .wordmaster()
                .map(|w| w.player_id == player_id)
                .unwrap_or(false);
            if is_wordmaster {
                let room = self.rooms.update_status(room_id, RoomStatus::Waiting).await?;
                self.broadcast_room_state(&room).await;
                self.connections
                    .send_to_room(
                        room_id,
                        ServerMessage::WordmasterDisconnectedDuringSetup {
                            nickname: nickname.clone(),
                        },
                    )
                    .await;
            }
        }

        let updated = self.rooms.remove_player(room_id, player_id).await?;
        self.sessions.forget_player(player_id).await;
        match updated {
            Some(room) => {
                self.broadcast_room_state(&room).await;
                self.connections
                    .send_to_room(
                        room_id,
                        ServerMessage::PlayerLeft {
                            player_id: player_id.to_string(),
                            nickname,
                        },
                    )
                    .await;
            }
            None => {
                self.purge_room(room_id).await?;
            }
        }
        Ok(())
    }

    async fn handle_disconnect_during_game(
        &self,
        room: &Room,
        game: Game,
        player_id: &str,
        nickname: &str,
    ) -> CoordinatorResult<()> {
        let game_id = game.game_id.clone();
        let is_wordmaster = game.wordmaster_id == player_id;
        let is_clue_giver = game
            .latest_round()
            .map(|round| round.clue_giver_id == player_id)
            .unwrap_or(false);
        let remaining_players = room.players.len().saturating_sub(1);

        if remaining_players < 3 {
            let message = format!(
                "{} disconnected. Not enough players to continue. Game ended.",
                nickname
            );
            self.games
                .append_log(&game_id, GameLogEvent::GameEnded, &message)
                .await?;
            return self
                .end_game_for_disconnect(room, &game_id, player_id, nickname, "Not enough players")
                .await;
        }

        if is_wordmaster {
            let message = format!("Wordmaster {} disconnected. Game ended.", nickname);
            self.games
                .append_log(&game_id, GameLogEvent::GameEnded, &message)
                .await?;
            return self
                .end_game_for_disconnect(
                    room,
                    &game_id,
                    player_id,
                    nickname,
                    "Wordmaster disconnected",
                )
                .await;
        }

        if is_clue_giver {
            let message = format!("Clue-giver {} disconnected. Ending round early.", nickname);
            self.games
                .append_log(&game_id, GameLogEvent::PlayerDisconnected, &message)
                .await?;

            let round_number = game
                .latest_round()
                .map(|round| round.round_number)
                .unwrap_or(game.current_round_number);
            self.cancel_round_timer(&game_id, round_number).await;
            self.games.remove_guesser(&game_id, player_id).await?;
            let game = self
                .games
                .end_round(&game_id, round_number, false, None)
                .await?;

            if game.guessers.len() >= 2 {
                if let Some(next_giver) = game.next_clue_giver() {
                    let game = self
                        .games
                        .start_round(&game_id, &next_giver, room.settings.wordmaster_guess_limit)
                        .await?;
                    let next_number = game.current_round_number;
                    let game = self
                        .games
                        .append_log(
                            &game_id,
                            GameLogEvent::RoundStarted,
                            &format!("Round {} started", next_number),
                        )
                        .await?;
                    let player = player_id.to_string();
                    let nick = nickname.to_string();
                    self.broadcast_game(&game, |game| {
                        ServerMessage::PlayerDisconnectedDuringGame {
                            game,
                            player_id: player.clone(),
                            nickname: nick.clone(),
                            was_clue_giver: true,
                        }
                    })
                    .await;
                    return Ok(());
                }
            }
            return self
                .end_game_for_disconnect(room, &game_id, player_id, nickname, "Not enough players")
                .await;
        }

        let message = format!("{} disconnected.", nickname);
        self.games
            .append_log(&game_id, GameLogEvent::PlayerDisconnected, &message)
            .await?;
        let game = self.games.remove_guesser(&game_id, player_id).await?;
        if game.guessers.len() < 2 {
            return self
                .end_game_for_disconnect(room, &game_id, player_id, nickname, "Not enough players")
                .await;
        }
        let player = player_id.to_string();
        let nick = nickname.to_string();
        self.broadcast_game(&game, |game| ServerMessage::PlayerDisconnectedDuringGame {
            game,
            player_id: player.clone(),
            nickname: nick.clone(),
            was_clue_giver: false,
        })
        .await;
        Ok(())
    }

    async fn end_game_for_disconnect(
        &self,
        room: &Room,
        game_id: &str,
        player_id: &str,
        nickname: &str,
        reason: &str,
    ) -> CoordinatorResult<()> {
        self.cancel_game_timers(game_id).await;
        let game = self.games.complete_game(game_id, None).await?;
        let room = self
            .rooms
            .update_status(&room.room_id, RoomStatus::Completed)
            .await?;
        self.broadcast_room_state(&room).await;

        let player = player_id.to_string();
        let nick = nickname.to_string();
        let reason = reason.to_string();
        self.broadcast_game(&game, |game| ServerMessage::GameEndedDisconnect {
            game,
            player_id: player.clone(),
            nickname: nick.clone(),
            reason: reason.clone(),
        })
        .await;
        Ok(())
    }

    /// Judges the round from what actually got recorded, pays out, closes
    /// the round, and either opens the next one or finishes the game when
    /// the last letter went up.
    async fn resolve_round_locked(
        &self,
        room: &Room,
        game_id: &str,
        round_number: u32,
    ) -> CoordinatorResult<()> {
        let Some(game) = self.games.find_game(game_id).await? else {
            return Ok(());
        };
        if !game.is_active() {
            return Ok(());
        }
        let Some(round) = game.round(round_number) else {
            return Ok(());
        };
        if !round.is_open() {
            return Ok(());
        }

        let outcome = judge_round(round);
        let clue_word = round.clue().map(|card| card.clue_word.clone());
        let clue_giver_id = round.clue_giver_id.clone();
        let correct_contact_players = match &clue_word {
            Some(word) if !round.contacts.is_empty() => {
                matching::check_contacts(&round.contacts, word).matched_players
            }
            _ => Vec::new(),
        };

        let mut points_awarded: HashMap<PlayerId, i32> = HashMap::new();
        let mut new_letter = None;

        match &outcome {
            RoundOutcome::Success { matched_players } => {
                new_letter = game.next_letter();
                if let Some(letter) = new_letter {
                    points_awarded = ScoringEngine::contact_awards(&clue_giver_id, matched_players);
                    for (player, points) in &points_awarded {
                        self.games.add_points(game_id, player, *points).await?;
                    }
                    let message = format!(
                        "Successful CONTACT! {} player(s) guessed \"{}\" correctly. Next letter revealed: {}",
                        matched_players.len(),
                        clue_word.as_deref().unwrap_or_default(),
                        letter
                    );
                    self.games
                        .append_log(game_id, GameLogEvent::ContactSuccess, &message)
                        .await?;
                }
            }
            RoundOutcome::Failure { reason } => {
                let message = match &clue_word {
                    Some(word) => format!(
                        "Contact failed. {}. Clue word was \"{}\".",
                        reason.describe(),
                        word
                    ),
                    None => format!("Contact failed. {}.", reason.describe()),
                };
                self.games
                    .append_log(game_id, GameLogEvent::ContactFailed, &message)
                    .await?;
            }
        }

        let contact_successful = outcome.successful();
        self.games
            .end_round(game_id, round_number, contact_successful, new_letter)
            .await?;
        let game = self
            .games
            .append_log(
                game_id,
                GameLogEvent::RoundEnded,
                &format!("Round {} ended.", round_number),
            )
            .await?;

        let round = game
            .round(round_number)
            .ok_or_else(|| CoordinatorError::not_found("Round vanished while resolving"))?;
        let revealed_contacts: Vec<RevealedContact> = round
            .contacts
            .iter()
            .map(|contact| RevealedContact {
                player_id: contact.player_id.clone(),
                word: contact.word.clone(),
                matched: clue_word
                    .as_deref()
                    .map(|word| matching::words_match(&contact.word, word))
                    .unwrap_or(false),
            })
            .collect();
        let wordmaster_guess = round.wordmaster_guesses.last().cloned();

        let new_letter_text = new_letter.map(|letter| letter.to_ascii_uppercase().to_string());
        let clue_word_payload = clue_word.clone();
        let contacts_payload = revealed_contacts.clone();
        let points_payload = points_awarded.clone();
        let matched_payload = correct_contact_players.clone();
        self.broadcast_game(&game, |game| ServerMessage::RoundEnded {
            game,
            round_number,
            contact_successful,
            clue_word: clue_word_payload.clone(),
            revealed_contacts: contacts_payload.clone(),
            new_letter: new_letter_text.clone(),
            points_awarded: points_payload.clone(),
            wordmaster_guess: wordmaster_guess.clone(),
            correct_contact_players: matched_payload.clone(),
        })
        .await;

        if game.fully_revealed() {
            self.games
                .append_log(
                    game_id,
                    GameLogEvent::GameCompleted,
                    "All letters revealed. No one guessed the word. Game over.",
                )
                .await?;
            let game = self.games.complete_game(game_id, None).await?;
            let room = self
                .rooms
                .update_status(&room.room_id, RoomStatus::Completed)
                .await?;
            self.broadcast_room_state(&room).await;
            self.broadcast_game(&game, |game| ServerMessage::GameCompleted {
                game,
                winner_id: None,
            })
            .await;
            return Ok(());
        }

        match game.next_clue_giver() {
            Some(next_giver) => {
                let game = self
                    .games
                    .start_round(game_id, &next_giver, room.settings.wordmaster_guess_limit)
                    .await?;
                let next_number = game.current_round_number;
                let giver_nickname = Self::nickname_of(room, &next_giver);
                let game = self
                    .games
                    .append_log(
                        game_id,
                        GameLogEvent::RoundStarted,
                        &format!(
                            "Round {} started. {} is the clue-giver.",
                            next_number, giver_nickname
                        ),
                    )
                    .await?;
                self.broadcast_game(&game, |game| ServerMessage::NextRoundStarted {
                    game,
                    round_number: next_number,
                })
                .await;
            }
            None => {
                // Rotation emptied out from disconnects; nothing left to play.
                let game = self.games.complete_game(game_id, None).await?;
                let room = self
                    .rooms
                    .update_status(&room.room_id, RoomStatus::Completed)
                    .await?;
                self.broadcast_room_state(&room).await;
                self.broadcast_game(&game, |game| ServerMessage::GameCompleted {
                    game,
                    winner_id: None,
                })
                .await;
            }
        }
        Ok(())
    }

    /// Reaps rooms nobody has touched or connected to in a while.
    pub async fn cleanup_idle_rooms(&self) {
        let Ok(rooms) = self.rooms.list_rooms().await else {
            return;
        };
        let cutoff = Utc::now() - chrono::Duration::minutes(self.config.room_idle_minutes);

        for room in rooms {
            let Ok(updated_at) = chrono::DateTime::parse_from_rfc3339(&room.updated_at) else {
                continue;
            };
            if updated_at.with_timezone(&Utc) >= cutoff {
                continue;
            }
            if !self.connections.room_recipients(&room.room_id).await.is_empty() {
                continue;
            }

            let lock = self.room_lock(&room.room_id).await;
            let _guard = lock.lock().await;
            if self.rooms.delete_room(&room.room_id).await.unwrap_or(false) {
                info!("Idle room {} removed", room.room_id);
                if let Err(e) = self.purge_room(&room.room_id).await {
                    error!("Failed to purge idle room {}: {}", room.room_id, e);
                }
            }
        }
    }

    // ===== Internals =====

    async fn room_lock(&self, room_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.room_locks.lock().await;
        locks
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn actor(
        &self,
        connection_id: ConnectionId,
    ) -> CoordinatorResult<(PlayerId, RoomId, String)> {
        let connection = self
            .connections
            .get_connection(connection_id)
            .await
            .ok_or_else(|| CoordinatorError::validation("Connection not found"))?;
        match (connection.player_id, connection.room_id, connection.nickname) {
            (Some(player_id), Some(room_id), Some(nickname)) => Ok((player_id, room_id, nickname)),
            _ => Err(CoordinatorError::validation(
                "Join a room before sending game actions",
            )),
        }
    }

    async fn require_room(&self, room_id: &str) -> CoordinatorResult<Room> {
        self.rooms
            .find_room(room_id)
            .await?
            .ok_or_else(|| CoordinatorError::not_found(format!("Room {} not found", room_id)))
    }

    async fn require_game(&self, game_id: &str, room_id: &str) -> CoordinatorResult<Game> {
        let game = self
            .games
            .find_game(game_id)
            .await?
            .ok_or_else(|| CoordinatorError::not_found(format!("Game {} not found", game_id)))?;
        if game.room_id != room_id {
            return Err(CoordinatorError::validation(
                "That game belongs to a different room",
            ));
        }
        Ok(game)
    }

    fn nickname_of(room: &Room, player_id: &str) -> String {
        room.player(player_id)
            .map(|player| player.nickname.clone())
            .unwrap_or_else(|| player_id.to_string())
    }

    async fn broadcast_room_state(&self, room: &Room) {
        self.connections
            .send_to_room(&room.room_id, ServerMessage::RoomUpdated { room: room.clone() })
            .await;
    }

    /// Sends each connection in the game's room its own view, so hidden
    /// words stay hidden per viewer.
    async fn broadcast_game<F>(&self, game: &Game, build: F)
    where
        F: Fn(GameView) -> ServerMessage,
    {
        for (connection_id, player_id) in self.connections.room_recipients(&game.room_id).await {
            let view = game.view_for(player_id.as_deref());
            let _ = self
                .connections
                .send_to_connection(connection_id, build(view))
                .await;
        }
    }

    async fn record_contact(
        &self,
        connection_id: ConnectionId,
        game_id: &str,
        room_id: &str,
        round_number: u32,
        word: &str,
        update: bool,
    ) -> CoordinatorResult<()> {
        let (player_id, bound_room, nickname) = self.actor(connection_id).await?;
        if bound_room != room_id {
            return Err(CoordinatorError::validation("You are not in that room"));
        }
        let word = word.trim();
        if word.is_empty() {
            return Err(CoordinatorError::validation("A contact word is required"));
        }

        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        self.require_game(game_id, room_id).await?;
        self.games
            .upsert_contact(game_id, round_number, &player_id, word)
            .await?;
        let (event, message) = if update {
            (
                GameLogEvent::ContactUpdated,
                format!("{} updated their contact guess", nickname),
            )
        } else {
            (
                GameLogEvent::ContactClicked,
                format!("{} clicked CONTACT!", nickname),
            )
        };
        let game = self.games.append_log(game_id, event, &message).await?;
        self.broadcast_game(&game, |game| ServerMessage::ContactUpdated {
            game,
            player_id: player_id.clone(),
        })
        .await;
        Ok(())
    }

    async fn schedule_round_timer(
        self: &Arc<Self>,
        game_id: &str,
        round_number: u32,
        duration: Duration,
    ) {
        let mut timers = self.round_timers.lock().await;
        // Replace whatever this game had pending; one live timer per game.
        timers.retain(|(timer_game, _), handle| {
            if timer_game == game_id {
                handle.abort();
                false
            } else {
                true
            }
        });

        let coordinator = Arc::clone(self);
        let task_game_id = game_id.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            coordinator
                .handle_round_timeout(&task_game_id, round_number)
                .await;
        });
        timers.insert((game_id.to_string(), round_number), handle);
    }

    async fn cancel_round_timer(&self, game_id: &str, round_number: u32) -> bool {
        let mut timers = self.round_timers.lock().await;
        if let Some(handle) = timers.remove(&(game_id.to_string(), round_number)) {
            handle.abort();
            true
        } else {
            false
        }
    }

    async fn cancel_game_timers(&self, game_id: &str) {
        let mut timers = self.round_timers.lock().await;
        timers.retain(|(timer_game, _), handle| {
            if timer_game == game_id {
                handle.abort();
                false
            } else {
                true
            }
        });
    }

    async fn schedule_grace_timer(self: &Arc<Self>, player_id: &str, room_id: &str) {
        let mut timers = self.grace_timers.lock().await;
        if let Some(previous) = timers.remove(player_id) {
            previous.abort();
        }

        let coordinator = Arc::clone(self);
        let player = player_id.to_string();
        let room = room_id.to_string();
        let grace = Duration::from_secs(self.config.disconnect_grace_seconds);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            coordinator.handle_grace_expired(&player, &room).await;
        });
        timers.insert(player_id.to_string(), handle);
    }

    async fn cancel_grace_timer(&self, player_id: &str) -> bool {
        let mut timers = self.grace_timers.lock().await;
        if let Some(handle) = timers.remove(player_id) {
            handle.abort();
            true
        } else {
            false
        }
    }

    async fn purge_room(&self, room_id: &str) -> CoordinatorResult<()> {
        let games = self.games.find_room_games(room_id).await?;
        for game in &games {
            self.cancel_game_timers(&game.game_id).await;
        }
        self.games.delete_room_games(room_id).await?;
        self.sessions.forget_room(room_id).await;
        self.connections.unbind_room(room_id).await;
        self.room_locks.lock().await.remove(room_id);
        info!("Room {} destroyed", room_id);
        Ok(())
    }
}
