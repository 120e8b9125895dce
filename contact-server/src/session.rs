use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use contact_types::{PlayerId, RoomId, SessionToken};

/// What a session token stands for.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub player_id: PlayerId,
    pub room_id: RoomId,
    pub nickname: String,
}

/// Maps opaque session tokens to player seats so a dropped connection can be
/// rebound without the client resending identity. Tokens are minted when a
/// connection binds to a room and revoked when the player's seat goes away.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionToken, SessionRecord>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Mints a token for the player's seat. Any previous token held by the
    /// same player stops resolving, so one seat has one live session.
    pub async fn issue(&self, player_id: &str, room_id: &str, nickname: &str) -> SessionToken {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, record| record.player_id != player_id);
        sessions.insert(
            token.clone(),
            SessionRecord {
                player_id: player_id.to_string(),
                room_id: room_id.to_string(),
                nickname: nickname.to_string(),
            },
        );
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<SessionRecord> {
        self.sessions.read().await.get(token).cloned()
    }

    pub async fn forget(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    /// Revokes every token the player holds. Used when their seat is
    /// removed from a room.
    pub async fn forget_player(&self, player_id: &str) {
        self.sessions
            .write()
            .await
            .retain(|_, record| record.player_id != player_id);
    }

    /// Revokes every token pointing at a room. Used when the room is
    /// destroyed.
    pub async fn forget_room(&self, room_id: &str) {
        self.sessions
            .write()
            .await
            .retain(|_, record| record.room_id != room_id);
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_tokens_resolve_to_the_seat() {
        let registry = SessionRegistry::new();
        let token = registry.issue("player_1", "ABC123", "Ada").await;

        let record = registry.resolve(&token).await.unwrap();
        assert_eq!(record.player_id, "player_1");
        assert_eq!(record.room_id, "ABC123");
        assert_eq!(record.nickname, "Ada");
    }

    #[tokio::test]
    async fn reissuing_revokes_the_previous_token() {
        let registry = SessionRegistry::new();
        let first = registry.issue("player_1", "ABC123", "Ada").await;
        let second = registry.issue("player_1", "ABC123", "Ada").await;

        assert!(registry.resolve(&first).await.is_none());
        assert!(registry.resolve(&second).await.is_some());
        assert_eq!(registry.session_count().await, 1);
    }

    #[tokio::test]
    async fn forgetting_a_player_only_drops_their_tokens() {
        let registry = SessionRegistry::new();
        registry.issue("player_1", "ABC123", "Ada").await;
        let kept = registry.issue("player_2", "ABC123", "Brin").await;

        registry.forget_player("player_1").await;

        assert_eq!(registry.session_count().await, 1);
        assert!(registry.resolve(&kept).await.is_some());
    }

    #[tokio::test]
    async fn forgetting_a_room_drops_every_seat_in_it() {
        let registry = SessionRegistry::new();
        registry.issue("player_1", "ABC123", "Ada").await;
        registry.issue("player_2", "ABC123", "Brin").await;
        let other = registry.issue("player_3", "XYZ999", "Cody").await;

        registry.forget_room("ABC123").await;

        assert_eq!(registry.session_count().await, 1);
        assert!(registry.resolve(&other).await.is_some());
    }
}
