use contact_types::{ContactEntry, PlayerId};

/// Case-insensitive comparison used for every word check in the game.
pub fn words_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Target words are at least five letters, nothing but letters.
pub fn valid_target_word(word: &str) -> bool {
    let word = word.trim();
    word.chars().count() >= 5 && word.chars().all(|c| c.is_ascii_alphabetic())
}

/// A first clue word has to extend the currently revealed prefix of the
/// target word.
pub fn extends_revealed_prefix(clue_word: &str, revealed_letters: &[String]) -> bool {
    let prefix: String = revealed_letters.concat();
    let mut clue_chars = clue_word.trim().chars();
    for expected in prefix.chars() {
        match clue_chars.next() {
            Some(c) if c.eq_ignore_ascii_case(&expected) => {}
            _ => return false,
        }
    }
    true
}

/// Next letter of the target word to reveal, if any remain hidden.
pub fn next_revealed_letter(target_word: &str, revealed_count: usize) -> Option<char> {
    target_word
        .chars()
        .nth(revealed_count)
        .map(|c| c.to_ascii_uppercase())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactCheck {
    /// True when at least one contact exists and none of them miss.
    pub all_matched: bool,
    pub matched_players: Vec<PlayerId>,
}

/// Checks every submitted contact against the clue word.
pub fn check_contacts(contacts: &[ContactEntry], clue_word: &str) -> ContactCheck {
    let matched_players: Vec<PlayerId> = contacts
        .iter()
        .filter(|c| words_match(&c.word, clue_word))
        .map(|c| c.player_id.clone())
        .collect();
    ContactCheck {
        all_matched: !contacts.is_empty() && matched_players.len() == contacts.len(),
        matched_players,
    }
}
