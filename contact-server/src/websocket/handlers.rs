use std::sync::Arc;
use tracing::{debug, info};

use crate::coordinator::GameCoordinator;
use crate::websocket::connection::ConnectionId;
use contact_types::{ClientMessage, ServerMessage};

/// Routes one connection's messages into the coordinator and decides which
/// failures the client hears about.
#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    coordinator: Arc<GameCoordinator>,
}

impl MessageHandler {
    pub fn new(connection_id: ConnectionId, coordinator: Arc<GameCoordinator>) -> Self {
        Self {
            connection_id,
            coordinator,
        }
    }

    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), String> {
        self.coordinator
            .connections()
            .update_activity(self.connection_id)
            .await;

        let outcome = match message {
            ClientMessage::JoinRoom {
                room_id,
                player_id,
                nickname,
            } => {
                self.coordinator
                    .handle_join_room(self.connection_id, &room_id, &player_id, &nickname)
                    .await
            }
            ClientMessage::ResumeSession { session_token } => {
                self.coordinator
                    .handle_resume_session(self.connection_id, &session_token)
                    .await
            }
            ClientMessage::PlayerReady { room_id } => {
                self.coordinator
                    .handle_player_ready(self.connection_id, &room_id)
                    .await
            }
            ClientMessage::SubmitClue {
                game_id,
                room_id,
                round_number,
                clue_word,
                clue,
                is_second_clue,
            } => {
                self.coordinator
                    .handle_submit_clue(
                        self.connection_id,
                        &game_id,
                        &room_id,
                        round_number,
                        clue_word.as_deref(),
                        &clue,
                        is_second_clue,
                    )
                    .await
            }
            ClientMessage::ContactClick {
                game_id,
                room_id,
                round_number,
                word,
            } => {
                self.coordinator
                    .handle_contact_click(self.connection_id, &game_id, &room_id, round_number, &word)
                    .await
            }
            ClientMessage::UpdateContact {
                game_id,
                room_id,
                round_number,
                word,
            } => {
                self.coordinator
                    .handle_update_contact(
                        self.connection_id,
                        &game_id,
                        &room_id,
                        round_number,
                        &word,
                    )
                    .await
            }
            ClientMessage::RemoveContact {
                game_id,
                room_id,
                round_number,
            } => {
                self.coordinator
                    .handle_remove_contact(self.connection_id, &game_id, &room_id, round_number)
                    .await
            }
            ClientMessage::WordmasterGuess {
                game_id,
                room_id,
                round_number,
                guess,
            } => {
                self.coordinator
                    .handle_wordmaster_guess(
                        self.connection_id,
                        &game_id,
                        &room_id,
                        round_number,
                        &guess,
                    )
                    .await
            }
            ClientMessage::TargetWordGuess {
                game_id,
                room_id,
                guess,
            } => {
                self.coordinator
                    .handle_target_word_guess(self.connection_id, &game_id, &room_id, &guess)
                    .await
            }
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(err) if err.should_notify() => self.send_error(&err.to_string()).await,
            Err(err) => {
                debug!(
                    "Dropped stale action from connection {}: {}",
                    self.connection_id, err
                );
                Ok(())
            }
        }
    }

    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);
        self.coordinator
            .handle_socket_disconnect(self.connection_id)
            .await;
    }

    pub async fn report_invalid_message(&self) -> Result<(), String> {
        self.send_error("Unrecognized message").await
    }

    async fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.coordinator
            .connections()
            .send_to_connection(self.connection_id, message)
            .await
    }

    async fn send_error(&self, error_message: &str) -> Result<(), String> {
        self.send_message(ServerMessage::Error {
            message: error_message.to_string(),
        })
        .await
    }
}
