use thiserror::Error;
use warp::http::StatusCode;

use contact_core::StateError;
use contact_store::StoreError;

/// Failures surfaced by coordinator operations. Each variant decides both
/// the HTTP status for REST callers and whether socket callers get an error
/// notice at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// The action raced a transition that already resolved, e.g. a contact
    /// for a round the timer just closed. Dropped without a notice.
    #[error("{0}")]
    Stale(String),
}

impl CoordinatorError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoordinatorError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        CoordinatorError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CoordinatorError::NotFound(message.into())
    }

    /// Whether a socket caller should be told about this failure. Stale
    /// actions lose their race silently; the round outcome broadcast already
    /// tells the player everything they need.
    pub fn should_notify(&self) -> bool {
        !matches!(self, CoordinatorError::Stale(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CoordinatorError::Validation(_) => StatusCode::BAD_REQUEST,
            CoordinatorError::Forbidden(_) => StatusCode::FORBIDDEN,
            CoordinatorError::NotFound(_) => StatusCode::NOT_FOUND,
            CoordinatorError::Conflict(_) => StatusCode::CONFLICT,
            CoordinatorError::Stale(_) => StatusCode::CONFLICT,
        }
    }
}

impl From<StoreError> for CoordinatorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RoomNotFound(_) | StoreError::GameNotFound(_) => {
                CoordinatorError::NotFound(err.to_string())
            }
            StoreError::PlayerNotFound(_) => CoordinatorError::NotFound(err.to_string()),
            StoreError::Conflict(message) => CoordinatorError::Conflict(message),
            StoreError::State(state) => match state {
                StateError::GameCompleted
                | StateError::RoundEnded(_)
                | StateError::RoundNotFound(_) => CoordinatorError::Stale(state.to_string()),
                other => CoordinatorError::Validation(other.to_string()),
            },
        }
    }
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
