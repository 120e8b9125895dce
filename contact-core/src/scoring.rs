use std::collections::HashMap;

use contact_types::PlayerId;

/// Point values for every scoring path in a game of Contact.
pub struct ScoringEngine;

impl ScoringEngine {
    /// Award for guessing the target word with only one letter revealed.
    pub const TARGET_WORD_BASE_POINTS: i32 = 100;
    /// Deduction per revealed letter beyond the first.
    pub const TARGET_WORD_LETTER_PENALTY: i32 = 10;
    /// Guessing the target word never pays less than this.
    pub const TARGET_WORD_MINIMUM_POINTS: i32 = 20;
    /// Clue-giver's share of a successful contact.
    pub const CONTACT_CLUE_GIVER_POINTS: i32 = 20;
    /// Each matching guesser's share of a successful contact.
    pub const CONTACT_GUESSER_POINTS: i32 = 15;
    /// Awarded to the wordmaster for naming the clue word in time.
    pub const WORDMASTER_BLOCK_POINTS: i32 = 10;
    /// One-time bonus for the very first target word attempt of the game.
    pub const FIRST_ATTEMPT_BONUS: i32 = 25;

    /// Points for guessing the target word while `revealed_count` letters
    /// are visible. Decays from the base award and bottoms out at the
    /// minimum.
    pub fn target_word_points(revealed_count: usize) -> i32 {
        let extra_letters = revealed_count.saturating_sub(1) as i32;
        let points =
            Self::TARGET_WORD_BASE_POINTS - extra_letters * Self::TARGET_WORD_LETTER_PENALTY;
        points.max(Self::TARGET_WORD_MINIMUM_POINTS)
    }

    /// Full payout for a winning target word guess.
    pub fn target_word_award(revealed_count: usize, first_attempt_of_game: bool) -> i32 {
        let mut points = Self::target_word_points(revealed_count);
        if first_attempt_of_game {
            points += Self::FIRST_ATTEMPT_BONUS;
        }
        points
    }

    /// Per-player payout for a successful contact. The clue-giver takes the
    /// larger share, every matching guesser takes the smaller one.
    pub fn contact_awards(
        clue_giver_id: &str,
        matched_players: &[PlayerId],
    ) -> HashMap<PlayerId, i32> {
        let mut awards = HashMap::new();
        awards.insert(clue_giver_id.to_string(), Self::CONTACT_CLUE_GIVER_POINTS);
        for player_id in matched_players {
            if player_id != clue_giver_id {
                awards.insert(player_id.clone(), Self::CONTACT_GUESSER_POINTS);
            }
        }
        awards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_word_points_decay_by_ten_per_letter() {
        assert_eq!(ScoringEngine::target_word_points(1), 100);
        assert_eq!(ScoringEngine::target_word_points(2), 90);
        assert_eq!(ScoringEngine::target_word_points(3), 80);
        assert_eq!(ScoringEngine::target_word_points(7), 40);
    }

    #[test]
    fn target_word_points_never_drop_below_minimum() {
        assert_eq!(ScoringEngine::target_word_points(9), 20);
        assert_eq!(ScoringEngine::target_word_points(10), 20);
        assert_eq!(ScoringEngine::target_word_points(25), 20);
    }

    #[test]
    fn zero_revealed_letters_does_not_underflow() {
        assert_eq!(ScoringEngine::target_word_points(0), 100);
    }

    #[test]
    fn first_attempt_bonus_is_added_once_requested() {
        assert_eq!(ScoringEngine::target_word_award(1, false), 100);
        assert_eq!(ScoringEngine::target_word_award(1, true), 125);
        assert_eq!(ScoringEngine::target_word_award(3, true), 105);
    }

    #[test]
    fn contact_awards_split_between_giver_and_matchers() {
        let matched = vec!["g2".to_string(), "g3".to_string()];
        let awards = ScoringEngine::contact_awards("g1", &matched);
        assert_eq!(awards.get("g1"), Some(&20));
        assert_eq!(awards.get("g2"), Some(&15));
        assert_eq!(awards.get("g3"), Some(&15));
        assert_eq!(awards.len(), 3);
    }

    #[test]
    fn clue_giver_is_not_paid_twice() {
        let matched = vec!["g1".to_string(), "g2".to_string()];
        let awards = ScoringEngine::contact_awards("g1", &matched);
        assert_eq!(awards.get("g1"), Some(&20));
        assert_eq!(awards.get("g2"), Some(&15));
    }
}
