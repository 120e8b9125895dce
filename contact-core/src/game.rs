use std::collections::{HashMap, HashSet};

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use contact_types::{
    ClueCard, ContactEntry, GameId, GameLogEntry, GameLogEvent, GameStatus, GameView, PlayerId,
    Room, RoomId, Round, RoundState, SecondClue, WordmasterGuess,
};

use crate::matching;

/// Rejected mutations of the game state machine. `GameCompleted` and
/// `RoundEnded` flag actions that arrived after the state they targeted was
/// already resolved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("target word must be at least 5 letters")]
    TargetWordTooShort,
    #[error("target word must only contain letters")]
    TargetWordNotAlphabetic,
    #[error("a game needs at least two guessers")]
    NotEnoughGuessers,
    #[error("game is already completed")]
    GameCompleted,
    #[error("round {0} not found")]
    RoundNotFound(u32),
    #[error("round {0} has already ended")]
    RoundEnded(u32),
    #[error("round {0} is still open")]
    RoundStillOpen(u32),
    #[error("a clue has already been submitted this round")]
    ClueAlreadySubmitted,
    #[error("no clue has been submitted this round")]
    ClueNotSubmitted,
    #[error("a second clue has already been submitted this round")]
    SecondClueAlreadySubmitted,
    #[error("clue word must start with the revealed letters")]
    ClueWordPrefixMismatch,
    #[error("only the clue-giver can do that")]
    NotClueGiver,
    #[error("the clue-giver cannot submit a contact")]
    ClueGiverContact,
    #[error("only guessers can do that")]
    NotGuesser,
    #[error("only the wordmaster can do that")]
    NotWordmaster,
    #[error("no wordmaster guesses remaining this round")]
    NoGuessesRemaining,
    #[error("target word guess already used for this letter")]
    TargetAttemptUsed,
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

/// Result of a target word attempt. The attempt is spent whether or not the
/// guess was correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetAttempt {
    pub correct: bool,
    pub first_attempt_of_game: bool,
}

/// Authoritative state of one game of Contact. Every mutation goes through
/// these methods so a round can only move forward through its lifecycle and
/// a completed game stays completed.
#[derive(Debug, Clone)]
pub struct Game {
    pub game_id: GameId,
    pub room_id: RoomId,
    pub wordmaster_id: PlayerId,
    pub target_word: String,
    pub word_type: String,
    pub revealed_letters: Vec<String>,
    pub current_round_number: u32,
    /// Advances to the ended round's number, so the next clue-giver is
    /// `guessers[cursor % guessers.len()]` even after the list shrinks.
    pub clue_giver_cursor: usize,
    pub guessers: Vec<PlayerId>,
    pub rounds: Vec<Round>,
    pub scores: HashMap<PlayerId, i32>,
    pub used_target_attempts: HashSet<PlayerId>,
    pub any_target_attempt_made: bool,
    pub game_log: Vec<GameLogEntry>,
    pub status: GameStatus,
    pub winner_id: Option<PlayerId>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl Game {
    pub fn new(
        game_id: GameId,
        room: &Room,
        wordmaster_id: &str,
        target_word: &str,
        word_type: &str,
    ) -> Result<Self, StateError> {
        let target_word = target_word.trim().to_uppercase();
        if target_word.chars().count() < 5 {
            return Err(StateError::TargetWordTooShort);
        }
        if !target_word.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(StateError::TargetWordNotAlphabetic);
        }

        let guessers: Vec<PlayerId> = room
            .guessers()
            .iter()
            .map(|p| p.player_id.clone())
            .collect();
        if guessers.len() < 2 {
            return Err(StateError::NotEnoughGuessers);
        }

        let mut scores = HashMap::new();
        for player in &room.players {
            scores.insert(player.player_id.clone(), 0);
        }

        let mut revealed_letters = Vec::new();
        if let Some(first) = target_word.chars().next() {
            revealed_letters.push(first.to_string());
        }

        let mut game = Self {
            game_id,
            room_id: room.room_id.clone(),
            wordmaster_id: wordmaster_id.to_string(),
            target_word,
            word_type: word_type.trim().to_string(),
            revealed_letters,
            current_round_number: 1,
            clue_giver_cursor: 0,
            guessers,
            rounds: Vec::new(),
            scores,
            used_target_attempts: HashSet::new(),
            any_target_attempt_made: false,
            game_log: Vec::new(),
            status: GameStatus::Active,
            winner_id: None,
            created_at: now(),
            completed_at: None,
        };
        game.push_log(
            GameLogEvent::GameStarted,
            "Game started! Wordmaster has chosen the target word.",
        );
        Ok(game)
    }

    pub fn round(&self, round_number: u32) -> Option<&Round> {
        self.rounds.iter().find(|r| r.round_number == round_number)
    }

    fn round_mut(&mut self, round_number: u32) -> Result<&mut Round, StateError> {
        self.rounds
            .iter_mut()
            .find(|r| r.round_number == round_number)
            .ok_or(StateError::RoundNotFound(round_number))
    }

    pub fn latest_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn is_active(&self) -> bool {
        self.status == GameStatus::Active
    }

    pub fn is_guesser(&self, player_id: &str) -> bool {
        self.guessers.iter().any(|g| g == player_id)
    }

    pub fn revealed_prefix(&self) -> String {
        self.revealed_letters.concat()
    }

    pub fn fully_revealed(&self) -> bool {
        self.revealed_letters.len() >= self.target_word.chars().count()
    }

    /// Letter to reveal on the next successful contact, if any remain.
    pub fn next_letter(&self) -> Option<char> {
        matching::next_revealed_letter(&self.target_word, self.revealed_letters.len())
    }

    /// Who gives the clue for the upcoming round.
    pub fn next_clue_giver(&self) -> Option<PlayerId> {
        if self.guessers.is_empty() {
            return None;
        }
        self.guessers
            .get(self.clue_giver_cursor % self.guessers.len())
            .cloned()
    }

    pub fn score(&self, player_id: &str) -> i32 {
        self.scores.get(player_id).copied().unwrap_or(0)
    }

    fn ensure_active(&self) -> Result<(), StateError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(StateError::GameCompleted)
        }
    }

    /// Opens the next round. The previous round must be resolved first.
    pub fn start_round(
        &mut self,
        clue_giver_id: &str,
        wordmaster_guess_limit: u32,
    ) -> Result<u32, StateError> {
        self.ensure_active()?;
        if let Some(latest) = self.rounds.last() {
            if latest.is_open() {
                return Err(StateError::RoundStillOpen(latest.round_number));
            }
        }
        if !self.is_guesser(clue_giver_id) {
            return Err(StateError::NotGuesser);
        }
        self.rounds.push(Round {
            round_number: self.current_round_number,
            clue_giver_id: clue_giver_id.to_string(),
            state: RoundState::AwaitingClue,
            contacts: Vec::new(),
            wordmaster_guesses: Vec::new(),
            wordmaster_guesses_remaining: wordmaster_guess_limit,
            started_at: now(),
        });
        Ok(self.current_round_number)
    }

    /// Records the round's clue. The clue word must extend the revealed
    /// prefix of the target word.
    pub fn submit_clue(
        &mut self,
        round_number: u32,
        player_id: &str,
        clue_word: &str,
        clue: &str,
    ) -> Result<(), StateError> {
        self.ensure_active()?;
        let clue_word = clue_word.trim().to_uppercase();
        if !matching::extends_revealed_prefix(&clue_word, &self.revealed_letters) {
            return Err(StateError::ClueWordPrefixMismatch);
        }
        let round = self.round_mut(round_number)?;
        if round.clue_giver_id != player_id {
            return Err(StateError::NotClueGiver);
        }
        match &round.state {
            RoundState::AwaitingClue => {}
            RoundState::ClueGiven { .. } => return Err(StateError::ClueAlreadySubmitted),
            RoundState::Ended { .. } => return Err(StateError::RoundEnded(round_number)),
        }
        round.state = RoundState::ClueGiven {
            clue: ClueCard {
                clue_word,
                clue: clue.trim().to_string(),
                submitted_at: now(),
            },
            second_clue: None,
        };
        Ok(())
    }

    pub fn submit_second_clue(
        &mut self,
        round_number: u32,
        player_id: &str,
        clue: &str,
    ) -> Result<(), StateError> {
        self.ensure_active()?;
        let round = self.round_mut(round_number)?;
        if round.clue_giver_id != player_id {
            return Err(StateError::NotClueGiver);
        }
        match &mut round.state {
            RoundState::AwaitingClue => Err(StateError::ClueNotSubmitted),
            RoundState::ClueGiven { second_clue, .. } => {
                if second_clue.is_some() {
                    return Err(StateError::SecondClueAlreadySubmitted);
                }
                *second_clue = Some(SecondClue {
                    clue: clue.trim().to_string(),
                    submitted_at: now(),
                });
                Ok(())
            }
            RoundState::Ended { .. } => Err(StateError::RoundEnded(round_number)),
        }
    }

    /// Adds or replaces a guesser's contact for the round.
    pub fn upsert_contact(
        &mut self,
        round_number: u32,
        player_id: &str,
        word: &str,
    ) -> Result<(), StateError> {
        self.ensure_active()?;
        if !self.is_guesser(player_id) {
            return Err(StateError::NotGuesser);
        }
        let round = self.round_mut(round_number)?;
        if round.clue_giver_id == player_id {
            return Err(StateError::ClueGiverContact);
        }
        match &round.state {
            RoundState::AwaitingClue => return Err(StateError::ClueNotSubmitted),
            RoundState::ClueGiven { .. } => {}
            RoundState::Ended { .. } => return Err(StateError::RoundEnded(round_number)),
        }
        let entry = ContactEntry {
            player_id: player_id.to_string(),
            word: word.trim().to_uppercase(),
            submitted_at: now(),
        };
        match round
            .contacts
            .iter_mut()
            .find(|c| c.player_id == player_id)
        {
            Some(existing) => *existing = entry,
            None => round.contacts.push(entry),
        }
        Ok(())
    }

    /// Withdraws a guesser's contact. Removing a contact that was never
    /// placed is fine.
    pub fn remove_contact(&mut self, round_number: u32, player_id: &str) -> Result<(), StateError> {
        self.ensure_active()?;
        let round = self.round_mut(round_number)?;
        if !round.is_open() {
            return Err(StateError::RoundEnded(round_number));
        }
        round.contacts.retain(|c| c.player_id != player_id);
        Ok(())
    }

    /// Spends one wordmaster guess at the clue word. Returns whether it hit.
    pub fn add_wordmaster_guess(
        &mut self,
        round_number: u32,
        player_id: &str,
        guess: &str,
    ) -> Result<bool, StateError> {
        self.ensure_active()?;
        if player_id != self.wordmaster_id {
            return Err(StateError::NotWordmaster);
        }
        let round = self.round_mut(round_number)?;
        let clue_word = match &round.state {
            RoundState::AwaitingClue => return Err(StateError::ClueNotSubmitted),
            RoundState::ClueGiven { clue, .. } => clue.clue_word.clone(),
            RoundState::Ended { .. } => return Err(StateError::RoundEnded(round_number)),
        };
        if round.wordmaster_guesses_remaining == 0 {
            return Err(StateError::NoGuessesRemaining);
        }
        let guess = guess.trim().to_uppercase();
        let correct = matching::words_match(&guess, &clue_word);
        round.wordmaster_guesses.push(WordmasterGuess {
            guess,
            correct,
            timestamp: now(),
        });
        round.wordmaster_guesses_remaining -= 1;
        Ok(correct)
    }

    /// Spends a guesser's one target word attempt for the current letter and
    /// evaluates it. Attempts come back when a new letter is revealed; the
    /// first-of-game flag never resets.
    pub fn record_target_attempt(
        &mut self,
        player_id: &str,
        guess: &str,
    ) -> Result<TargetAttempt, StateError> {
        self.ensure_active()?;
        if !self.is_guesser(player_id) {
            return Err(StateError::NotGuesser);
        }
        if self.used_target_attempts.contains(player_id) {
            return Err(StateError::TargetAttemptUsed);
        }
        let first_attempt_of_game = !self.any_target_attempt_made;
        self.any_target_attempt_made = true;
        self.used_target_attempts.insert(player_id.to_string());
        Ok(TargetAttempt {
            correct: matching::words_match(guess, &self.target_word),
            first_attempt_of_game,
        })
    }

    /// Seals a round and advances the rotation. On success the next target
    /// letter is revealed and per-letter target attempts come back.
    pub fn end_round(
        &mut self,
        round_number: u32,
        contact_successful: bool,
        new_letter: Option<char>,
    ) -> Result<(), StateError> {
        self.ensure_active()?;
        let round = self.round_mut(round_number)?;
        let (clue, second_clue) = match round.state.clone() {
            RoundState::AwaitingClue => (None, None),
            RoundState::ClueGiven { clue, second_clue } => (Some(clue), second_clue),
            RoundState::Ended { .. } => return Err(StateError::RoundEnded(round_number)),
        };
        round.state = RoundState::Ended {
            clue,
            second_clue,
            contact_successful,
            ended_at: now(),
        };
        self.current_round_number = round_number + 1;
        self.clue_giver_cursor = round_number as usize;
        if let Some(letter) = new_letter {
            self.revealed_letters
                .push(letter.to_ascii_uppercase().to_string());
            self.used_target_attempts.clear();
        }
        debug!(
            game_id = %self.game_id,
            round_number,
            contact_successful,
            "round ended"
        );
        Ok(())
    }

    pub fn add_points(&mut self, player_id: &str, points: i32) {
        *self.scores.entry(player_id.to_string()).or_insert(0) += points;
    }

    /// Drops a guesser from the rotation after their grace period lapses.
    pub fn remove_guesser(&mut self, player_id: &str) {
        self.guessers.retain(|g| g != player_id);
    }

    pub fn push_log(&mut self, event: GameLogEvent, message: impl Into<String>) {
        self.game_log.push(GameLogEntry {
            event,
            message: message.into(),
            timestamp: now(),
        });
    }

    /// Finishes the game. A game completes exactly once.
    pub fn complete(&mut self, winner_id: Option<PlayerId>) -> Result<(), StateError> {
        self.ensure_active()?;
        self.status = GameStatus::Completed;
        self.winner_id = winner_id;
        self.completed_at = Some(now());
        debug!(game_id = %self.game_id, winner = ?self.winner_id, "game completed");
        Ok(())
    }

    /// Snapshot for one viewer. The target word only shows for the
    /// wordmaster or once the game is over, and hidden words of the open
    /// round (the clue word, other players' contacts) are starred out.
    pub fn view_for(&self, viewer: Option<&str>) -> GameView {
        let completed = self.status == GameStatus::Completed;
        let is_wordmaster = viewer == Some(self.wordmaster_id.as_str());

        let rounds = self
            .rounds
            .iter()
            .map(|round| {
                let mut round = round.clone();
                if round.is_open() && !completed {
                    let viewer_gives_clue = viewer == Some(round.clue_giver_id.as_str());
                    if let RoundState::ClueGiven { clue, .. } = &mut round.state {
                        if !viewer_gives_clue {
                            clue.clue_word = mask_word(&clue.clue_word);
                        }
                    }
                    for entry in &mut round.contacts {
                        if viewer != Some(entry.player_id.as_str()) {
                            entry.word = mask_word(&entry.word);
                        }
                    }
                }
                round
            })
            .collect();

        let mut used_target_attempts: Vec<PlayerId> =
            self.used_target_attempts.iter().cloned().collect();
        used_target_attempts.sort();

        GameView {
            game_id: self.game_id.clone(),
            room_id: self.room_id.clone(),
            wordmaster_id: self.wordmaster_id.clone(),
            word_type: self.word_type.clone(),
            word_length: self.target_word.chars().count() as u32,
            target_word: (completed || is_wordmaster).then(|| self.target_word.clone()),
            revealed_letters: self.revealed_letters.clone(),
            current_round_number: self.current_round_number,
            guessers: self.guessers.clone(),
            rounds,
            scores: self.scores.clone(),
            used_target_attempts,
            game_log: self.game_log.clone(),
            status: self.status,
            winner_id: self.winner_id.clone(),
            created_at: self.created_at.clone(),
            completed_at: self.completed_at.clone(),
        }
    }

    /// Snapshot with every secret masked, for callers with no seat.
    pub fn spectator_view(&self) -> GameView {
        self.view_for(None)
    }
}

fn mask_word(word: &str) -> String {
    "*".repeat(word.chars().count())
}
