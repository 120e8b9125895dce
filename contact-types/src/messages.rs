use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::game::{GameView, RevealedContact, WordmasterGuess};
use crate::ids::{GameId, PlayerId, RoomId, SessionToken};
use crate::room::Room;

/// Messages sent from client to server. The acting player is always the one
/// bound to the sending connection; payload ids only locate the room, game
/// and round the action targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Bind this connection to a seat the player already holds in the room.
    JoinRoom {
        room_id: RoomId,
        player_id: PlayerId,
        nickname: String,
    },
    /// Rebind a dropped connection using a previously issued token.
    ResumeSession { session_token: SessionToken },
    PlayerReady { room_id: RoomId },
    SubmitClue {
        game_id: GameId,
        room_id: RoomId,
        round_number: u32,
        /// Required for the first clue of a round, absent for the second.
        #[serde(default)]
        clue_word: Option<String>,
        clue: String,
        #[serde(default)]
        is_second_clue: bool,
    },
    ContactClick {
        game_id: GameId,
        room_id: RoomId,
        round_number: u32,
        word: String,
    },
    UpdateContact {
        game_id: GameId,
        room_id: RoomId,
        round_number: u32,
        word: String,
    },
    RemoveContact {
        game_id: GameId,
        room_id: RoomId,
        round_number: u32,
    },
    WordmasterGuess {
        game_id: GameId,
        room_id: RoomId,
        round_number: u32,
        guess: String,
    },
    TargetWordGuess {
        game_id: GameId,
        room_id: RoomId,
        guess: String,
    },
}

/// Messages sent from server to client. Every `GameView` inside one of these
/// has already been personalized for the receiving connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    SessionEstablished {
        session_token: SessionToken,
        player_id: PlayerId,
        room_id: RoomId,
        nickname: String,
    },
    RoomUpdated {
        room: Room,
    },
    PlayerLeft {
        player_id: PlayerId,
        nickname: String,
    },
    PlayerKicked {
        player_id: PlayerId,
        nickname: String,
    },
    PlayerReconnected {
        player_id: PlayerId,
        nickname: String,
    },
    /// The room was closed by the admin or reaped after idling; every seat
    /// in it is gone.
    RoomClosed {
        room_id: RoomId,
    },
    /// The room moved to `starting` and the wordmaster is picking a word.
    WordmasterChoosing {
        wordmaster_id: PlayerId,
        nickname: String,
    },
    /// Sent only to the wordmaster's connection.
    ShowTargetWordModal,
    GameStarted {
        game: GameView,
    },
    ClueSubmitted {
        game: GameView,
        round_number: u32,
        clue: String,
        is_second_clue: bool,
    },
    RoundTimerStarted {
        game_id: GameId,
        round_number: u32,
        duration_ms: u64,
        started_at: String,
    },
    ContactUpdated {
        game: GameView,
        player_id: PlayerId,
    },
    WordmasterGuessed {
        game: GameView,
        round_number: u32,
        guess: String,
        correct: bool,
    },
    RoundEnded {
        game: GameView,
        round_number: u32,
        contact_successful: bool,
        clue_word: Option<String>,
        revealed_contacts: Vec<RevealedContact>,
        new_letter: Option<String>,
        points_awarded: HashMap<PlayerId, i32>,
        wordmaster_guess: Option<WordmasterGuess>,
        correct_contact_players: Vec<PlayerId>,
    },
    NextRoundStarted {
        game: GameView,
        round_number: u32,
    },
    /// Sent only to the guesser who attempted the target word.
    TargetWordGuessResult {
        game: GameView,
        correct: bool,
    },
    GameCompleted {
        game: GameView,
        winner_id: Option<PlayerId>,
    },
    PlayerDisconnectedDuringGame {
        game: GameView,
        player_id: PlayerId,
        nickname: String,
        was_clue_giver: bool,
    },
    GameEndedDisconnect {
        game: GameView,
        player_id: PlayerId,
        nickname: String,
        reason: String,
    },
    WordmasterDisconnectedDuringSetup {
        nickname: String,
    },
    Error {
        message: String,
    },
}
