use async_trait::async_trait;

use contact_core::{Game, TargetAttempt};
use contact_types::{GameLogEvent, PlayerId, PlayerRole, Room, RoomSettings, RoomStatus};

use crate::error::StoreResult;

/// Room persistence. Implementations return the post-mutation room so
/// callers always broadcast the state they actually wrote.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Creates a room with a fresh join code and the admin already seated.
    async fn create_room(
        &self,
        admin_id: &str,
        admin_nickname: &str,
        settings: RoomSettings,
    ) -> StoreResult<Room>;

    async fn find_room(&self, room_id: &str) -> StoreResult<Option<Room>>;

    async fn list_rooms(&self) -> StoreResult<Vec<Room>>;

    /// Seats a player. Re-adding a seated player marks them ready instead of
    /// duplicating the seat.
    async fn add_player(&self, room_id: &str, player_id: &str, nickname: &str)
    -> StoreResult<Room>;

    /// Unseats a player, promoting the next player in join order to admin if
    /// needed. Returns `None` when the last player left and the room was
    /// destroyed.
    async fn remove_player(&self, room_id: &str, player_id: &str) -> StoreResult<Option<Room>>;

    async fn set_player_ready(
        &self,
        room_id: &str,
        player_id: &str,
        is_ready: bool,
    ) -> StoreResult<Room>;

    /// Assigns or clears a seat role. Only one player may hold the
    /// wordmaster role, and roles are locked once the room leaves `waiting`.
    async fn set_player_role(
        &self,
        room_id: &str,
        player_id: &str,
        role: Option<PlayerRole>,
    ) -> StoreResult<Room>;

    async fn update_settings(&self, room_id: &str, settings: RoomSettings) -> StoreResult<Room>;

    /// Moves the room through its lifecycle. Entering `starting` clears
    /// every ready flag for the next confirmation round.
    async fn update_status(&self, room_id: &str, status: RoomStatus) -> StoreResult<Room>;

    async fn delete_room(&self, room_id: &str) -> StoreResult<bool>;
}

/// Game persistence. Mutations delegate to the state machine in
/// `contact_core::Game` and return the post-mutation game.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Creates a game for the room with round 1 already open for the first
    /// guesser in rotation. Fails when the room already has an active game.
    async fn create_game(
        &self,
        room: &Room,
        wordmaster_id: &str,
        target_word: &str,
        word_type: &str,
    ) -> StoreResult<Game>;

    async fn find_game(&self, game_id: &str) -> StoreResult<Option<Game>>;

    /// Games for a room, newest first.
    async fn find_room_games(&self, room_id: &str) -> StoreResult<Vec<Game>>;

    async fn find_active_game(&self, room_id: &str) -> StoreResult<Option<Game>>;

    async fn start_round(
        &self,
        game_id: &str,
        clue_giver_id: &str,
        wordmaster_guess_limit: u32,
    ) -> StoreResult<Game>;

    async fn submit_clue(
        &self,
        game_id: &str,
        round_number: u32,
        player_id: &str,
        clue_word: &str,
        clue: &str,
    ) -> StoreResult<Game>;

    async fn submit_second_clue(
        &self,
        game_id: &str,
        round_number: u32,
        player_id: &str,
        clue: &str,
    ) -> StoreResult<Game>;

    async fn upsert_contact(
        &self,
        game_id: &str,
        round_number: u32,
        player_id: &str,
        word: &str,
    ) -> StoreResult<Game>;

    async fn remove_contact(
        &self,
        game_id: &str,
        round_number: u32,
        player_id: &str,
    ) -> StoreResult<Game>;

    /// Returns the updated game and whether the guess named the clue word.
    async fn add_wordmaster_guess(
        &self,
        game_id: &str,
        round_number: u32,
        player_id: &str,
        guess: &str,
    ) -> StoreResult<(Game, bool)>;

    /// Returns the updated game and the evaluated attempt.
    async fn record_target_attempt(
        &self,
        game_id: &str,
        player_id: &str,
        guess: &str,
    ) -> StoreResult<(Game, TargetAttempt)>;

    async fn add_points(&self, game_id: &str, player_id: &str, points: i32) -> StoreResult<Game>;

    async fn remove_guesser(&self, game_id: &str, player_id: &str) -> StoreResult<Game>;

    async fn end_round(
        &self,
        game_id: &str,
        round_number: u32,
        contact_successful: bool,
        new_letter: Option<char>,
    ) -> StoreResult<Game>;

    async fn append_log(
        &self,
        game_id: &str,
        event: GameLogEvent,
        message: &str,
    ) -> StoreResult<Game>;

    async fn complete_game(&self, game_id: &str, winner_id: Option<PlayerId>) -> StoreResult<Game>;

    /// Purges every game belonging to a room. Used when a room is deleted.
    async fn delete_room_games(&self, room_id: &str) -> StoreResult<()>;
}
