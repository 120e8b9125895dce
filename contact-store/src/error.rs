use thiserror::Error;

use contact_core::StateError;
use contact_types::{GameId, PlayerId, RoomId};

/// Failures surfaced by the storage layer. `State` wraps rejections from the
/// game state machine itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    #[error("game {0} not found")]
    GameNotFound(GameId),
    #[error("player {0} is not in the room")]
    PlayerNotFound(PlayerId),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    State(#[from] StateError),
}

impl StoreError {
    pub fn conflict(message: impl Into<String>) -> Self {
        StoreError::Conflict(message.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
