use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{PlayerId, RoomId};

/// Seat role inside a room. A room needs exactly one wordmaster and at least
/// two guessers before a game can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    Wordmaster,
    Guesser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub player_id: PlayerId,
    pub nickname: String,
    pub role: Option<PlayerRole>,
    pub is_ready: bool,
    pub joined_at: String, // ISO 8601 string
}

/// Knobs the admin can tune while the room is still waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomSettings {
    pub round_time_minutes: u32,
    pub wordmaster_guess_limit: u32,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            round_time_minutes: 2,
            wordmaster_guess_limit: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum RoomStatus {
    Waiting,
    Starting,
    InGame,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Room {
    pub room_id: RoomId,
    pub admin_id: PlayerId,
    pub players: Vec<Player>,
    pub settings: RoomSettings,
    pub status: RoomStatus,
    pub created_at: String, // ISO 8601 string
    pub updated_at: String, // ISO 8601 string
}

impl Room {
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    pub fn is_member(&self, player_id: &str) -> bool {
        self.player(player_id).is_some()
    }

    pub fn is_admin(&self, player_id: &str) -> bool {
        self.admin_id == player_id
    }

    pub fn wordmaster(&self) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.role == Some(PlayerRole::Wordmaster))
    }

    pub fn guessers(&self) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|p| p.role == Some(PlayerRole::Guesser))
            .collect()
    }

    pub fn all_ready(&self) -> bool {
        self.players.iter().all(|p| p.is_ready)
    }

    pub fn all_roles_assigned(&self) -> bool {
        self.players.iter().all(|p| p.role.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seated_player(id: &str, role: Option<PlayerRole>) -> Player {
        Player {
            player_id: id.to_string(),
            nickname: id.to_uppercase(),
            role,
            is_ready: true,
            joined_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn two_seat_room() -> Room {
        Room {
            room_id: "ABC123".to_string(),
            admin_id: "p1".to_string(),
            players: vec![
                seated_player("p1", Some(PlayerRole::Wordmaster)),
                seated_player("p2", Some(PlayerRole::Guesser)),
            ],
            settings: RoomSettings::default(),
            status: RoomStatus::Waiting,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn default_settings_match_lobby_defaults() {
        let settings = RoomSettings::default();
        assert_eq!(settings.round_time_minutes, 2);
        assert_eq!(settings.wordmaster_guess_limit, 3);
    }

    #[test]
    fn role_lookups() {
        let room = two_seat_room();
        assert_eq!(room.wordmaster().unwrap().player_id, "p1");
        assert_eq!(room.guessers().len(), 1);
        assert!(room.is_admin("p1"));
        assert!(!room.is_admin("p2"));
        assert!(room.all_roles_assigned());
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&RoomStatus::InGame).unwrap();
        assert_eq!(json, "\"in-game\"");
    }
}
