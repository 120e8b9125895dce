use contact_core::Game;
use contact_types::{Player, PlayerRole, Room, RoomSettings, RoomStatus};

pub fn seated_player(id: &str, nickname: &str, role: PlayerRole) -> Player {
    Player {
        player_id: id.to_string(),
        nickname: nickname.to_string(),
        role: Some(role),
        is_ready: true,
        joined_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

/// Room with a wordmaster and three guessers, ready to play.
pub fn standard_room() -> Room {
    Room {
        room_id: "ABC123".to_string(),
        admin_id: "wm".to_string(),
        players: vec![
            seated_player("wm", "Wanda", PlayerRole::Wordmaster),
            seated_player("alice", "Alice", PlayerRole::Guesser),
            seated_player("bob", "Bob", PlayerRole::Guesser),
            seated_player("cora", "Cora", PlayerRole::Guesser),
        ],
        settings: RoomSettings::default(),
        status: RoomStatus::InGame,
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

/// Game on the word HARMONY with round 1 open and Alice giving the clue.
pub fn harmony_game() -> Game {
    let room = standard_room();
    let mut game = Game::new("game_1".to_string(), &room, "wm", "HARMONY", "thing").unwrap();
    game.start_round("alice", room.settings.wordmaster_guess_limit)
        .unwrap();
    game
}
