use contact_types::{PlayerId, Round};

use crate::matching;

/// Why a round did not produce a successful contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundFailure {
    WordmasterBlocked,
    ContactsMismatched,
    NoContacts,
    NoClue,
}

impl RoundFailure {
    pub fn describe(&self) -> &'static str {
        match self {
            RoundFailure::WordmasterBlocked => "Wordmaster blocked successfully",
            RoundFailure::ContactsMismatched => "Contact guesses did not match",
            RoundFailure::NoContacts => "No contacts were made",
            RoundFailure::NoClue => "No clue was given",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    Success { matched_players: Vec<PlayerId> },
    Failure { reason: RoundFailure },
}

impl RoundOutcome {
    pub fn successful(&self) -> bool {
        matches!(self, RoundOutcome::Success { .. })
    }
}

/// Decides a round from its recorded state. A round succeeds only when the
/// wordmaster never named the clue word and every submitted contact (at
/// least one) matches it. A correct wordmaster guess is the only way a round
/// resolves before its timer, so the block check comes first.
pub fn judge_round(round: &Round) -> RoundOutcome {
    if round.blocked() {
        return RoundOutcome::Failure {
            reason: RoundFailure::WordmasterBlocked,
        };
    }
    let Some(clue) = round.clue() else {
        return RoundOutcome::Failure {
            reason: RoundFailure::NoClue,
        };
    };
    if round.contacts.is_empty() {
        return RoundOutcome::Failure {
            reason: RoundFailure::NoContacts,
        };
    }
    let check = matching::check_contacts(&round.contacts, &clue.clue_word);
    if !check.all_matched {
        return RoundOutcome::Failure {
            reason: RoundFailure::ContactsMismatched,
        };
    }
    RoundOutcome::Success {
        matched_players: check.matched_players,
    }
}
