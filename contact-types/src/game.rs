use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{GameId, PlayerId, RoomId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Active,
    Completed,
}

/// First clue of a round. The clue word stays hidden from everyone but its
/// author until the round resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClueCard {
    pub clue_word: String,
    pub clue: String,
    pub submitted_at: String, // ISO 8601 string
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SecondClue {
    pub clue: String,
    pub submitted_at: String, // ISO 8601 string
}

/// A guesser's claim that they know the clue word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactEntry {
    pub player_id: PlayerId,
    pub word: String,
    pub submitted_at: String, // ISO 8601 string
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WordmasterGuess {
    pub guess: String,
    pub correct: bool,
    pub timestamp: String, // ISO 8601 string
}

/// Lifecycle of a round. Transitions only move forward: a clue can only be
/// submitted once, and an ended round never reopens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RoundState {
    AwaitingClue,
    ClueGiven {
        clue: ClueCard,
        second_clue: Option<SecondClue>,
    },
    Ended {
        clue: Option<ClueCard>,
        second_clue: Option<SecondClue>,
        contact_successful: bool,
        ended_at: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Round {
    pub round_number: u32,
    pub clue_giver_id: PlayerId,
    pub state: RoundState,
    pub contacts: Vec<ContactEntry>,
    pub wordmaster_guesses: Vec<WordmasterGuess>,
    pub wordmaster_guesses_remaining: u32,
    pub started_at: String, // ISO 8601 string
}

impl Round {
    pub fn is_open(&self) -> bool {
        !matches!(self.state, RoundState::Ended { .. })
    }

    pub fn clue(&self) -> Option<&ClueCard> {
        match &self.state {
            RoundState::AwaitingClue => None,
            RoundState::ClueGiven { clue, .. } => Some(clue),
            RoundState::Ended { clue, .. } => clue.as_ref(),
        }
    }

    pub fn second_clue(&self) -> Option<&SecondClue> {
        match &self.state {
            RoundState::AwaitingClue => None,
            RoundState::ClueGiven { second_clue, .. } => second_clue.as_ref(),
            RoundState::Ended { second_clue, .. } => second_clue.as_ref(),
        }
    }

    pub fn contact_for(&self, player_id: &str) -> Option<&ContactEntry> {
        self.contacts.iter().find(|c| c.player_id == player_id)
    }

    /// True once the wordmaster has named the clue word.
    pub fn blocked(&self) -> bool {
        self.wordmaster_guesses.iter().any(|g| g.correct)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum GameLogEvent {
    GameStarted,
    RoundStarted,
    ClueSubmitted,
    SecondClueSubmitted,
    ContactClicked,
    ContactUpdated,
    ContactRemoved,
    WordmasterGuess,
    ContactSuccess,
    ContactFailed,
    RoundEnded,
    TargetWordGuess,
    PlayerDisconnected,
    GameEnded,
    GameCompleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameLogEntry {
    pub event: GameLogEvent,
    pub message: String,
    pub timestamp: String, // ISO 8601 string
}

/// A contact revealed when a round resolves, with whether it matched the
/// clue word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RevealedContact {
    pub player_id: PlayerId,
    pub word: String,
    pub matched: bool,
}

/// Snapshot of a game as a client is allowed to see it. The target word is
/// only present for the wordmaster or once the game has completed, and the
/// open round's hidden words are masked per viewer before this leaves the
/// server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameView {
    pub game_id: GameId,
    pub room_id: RoomId,
    pub wordmaster_id: PlayerId,
    pub word_type: String,
    pub word_length: u32,
    pub target_word: Option<String>,
    pub revealed_letters: Vec<String>,
    pub current_round_number: u32,
    pub guessers: Vec<PlayerId>,
    pub rounds: Vec<Round>,
    pub scores: HashMap<PlayerId, i32>,
    pub used_target_attempts: Vec<PlayerId>,
    pub game_log: Vec<GameLogEntry>,
    pub status: GameStatus,
    pub winner_id: Option<PlayerId>,
    pub created_at: String, // ISO 8601 string
    pub completed_at: Option<String>,
}

impl GameView {
    pub fn round(&self, round_number: u32) -> Option<&Round> {
        self.rounds.iter().find(|r| r.round_number == round_number)
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.round(self.current_round_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_round() -> Round {
        Round {
            round_number: 1,
            clue_giver_id: "p2".to_string(),
            state: RoundState::ClueGiven {
                clue: ClueCard {
                    clue_word: "HARBOR".to_string(),
                    clue: "Ships shelter here".to_string(),
                    submitted_at: "2024-01-01T00:00:00Z".to_string(),
                },
                second_clue: None,
            },
            contacts: vec![],
            wordmaster_guesses: vec![],
            wordmaster_guesses_remaining: 3,
            started_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn round_state_tags_with_phase() {
        let round = open_round();
        let json = serde_json::to_value(&round.state).unwrap();
        assert_eq!(json["phase"], "clue_given");
        assert_eq!(json["clue"]["clue_word"], "HARBOR");
    }

    #[test]
    fn ended_rounds_are_not_open() {
        let mut round = open_round();
        assert!(round.is_open());
        round.state = RoundState::Ended {
            clue: round.clue().cloned(),
            second_clue: None,
            contact_successful: true,
            ended_at: "2024-01-01T00:02:00Z".to_string(),
        };
        assert!(!round.is_open());
        assert!(round.clue().is_some());
    }

    #[test]
    fn blocked_requires_a_correct_guess() {
        let mut round = open_round();
        round.wordmaster_guesses.push(WordmasterGuess {
            guess: "HARVEST".to_string(),
            correct: false,
            timestamp: "2024-01-01T00:01:00Z".to_string(),
        });
        assert!(!round.blocked());
        round.wordmaster_guesses.push(WordmasterGuess {
            guess: "HARBOR".to_string(),
            correct: true,
            timestamp: "2024-01-01T00:01:30Z".to_string(),
        });
        assert!(round.blocked());
    }
}
