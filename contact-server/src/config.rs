use std::env;

use contact_types::RoomSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_players_per_room: usize,
    pub default_round_time_minutes: u32,
    pub default_wordmaster_guess_limit: u32,
    pub disconnect_grace_seconds: u64,
    pub connection_timeout_seconds: u64,
    pub room_idle_minutes: i64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .expect("Invalid PORT"),
            max_players_per_room: env::var("MAX_PLAYERS_PER_ROOM")
                .unwrap_or_else(|_| "6".to_string())
                .parse()
                .expect("Invalid MAX_PLAYERS_PER_ROOM"),
            default_round_time_minutes: env::var("DEFAULT_ROUND_TIME_MINUTES")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .expect("Invalid DEFAULT_ROUND_TIME_MINUTES"),
            default_wordmaster_guess_limit: env::var("DEFAULT_WORDMASTER_GUESS_LIMIT")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .expect("Invalid DEFAULT_WORDMASTER_GUESS_LIMIT"),
            disconnect_grace_seconds: env::var("DISCONNECT_GRACE_SECONDS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("Invalid DISCONNECT_GRACE_SECONDS"),
            connection_timeout_seconds: env::var("CONNECTION_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("Invalid CONNECTION_TIMEOUT_SECONDS"),
            room_idle_minutes: env::var("ROOM_IDLE_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("Invalid ROOM_IDLE_MINUTES"),
        }
    }

    /// Room settings a fresh room starts out with.
    pub fn default_room_settings(&self) -> RoomSettings {
        RoomSettings {
            round_time_minutes: self.default_round_time_minutes,
            wordmaster_guess_limit: self.default_wordmaster_guess_limit,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
