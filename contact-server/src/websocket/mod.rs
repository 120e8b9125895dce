pub mod connection;
pub mod handlers;
pub mod rate_limiter;

pub use connection::{Connection, ConnectionId, ConnectionManager};
pub use handlers::MessageHandler;
pub use rate_limiter::RateLimiter;

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};

use crate::coordinator::GameCoordinator;
use contact_types::ClientMessage;

pub async fn handle_connection(websocket: WebSocket, coordinator: Arc<GameCoordinator>) {
    let connection_id = ConnectionId::new();
    info!("New WebSocket connection: {}", connection_id);

    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let mut message_receiver = coordinator
        .connections()
        .create_connection(connection_id)
        .await;

    let handler = MessageHandler::new(connection_id, coordinator.clone());
    let mut rate_limiter = RateLimiter::default();

    // Pump coordinator broadcasts out to the socket
    let outgoing_task = tokio::spawn(async move {
        while let Some(message) = message_receiver.recv().await {
            match serde_json::to_string(&message) {
                Ok(json) => {
                    if let Err(e) = ws_sender.send(Message::text(json)).await {
                        error!("Failed to send WebSocket message: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize server message: {}", e);
                }
            }
        }
    });

    // Read client messages until the socket closes
    let incoming_task = {
        let handler = handler.clone();
        tokio::spawn(async move {
            while let Some(result) = ws_receiver.next().await {
                match result {
                    Ok(message) => {
                        if message.is_text() {
                            if !rate_limiter.allow() {
                                warn!("Rate limit exceeded for connection {}", connection_id);
                                break;
                            }

                            let text = message.to_str().unwrap_or_default();
                            match serde_json::from_str::<ClientMessage>(text) {
                                Ok(client_message) => {
                                    if let Err(e) = handler.handle_message(client_message).await {
                                        error!(
                                            "Error handling message from {}: {}",
                                            connection_id, e
                                        );
                                        break;
                                    }
                                }
                                Err(e) => {
                                    // A malformed frame gets a notice, not a
                                    // hangup. Party game clients mid-update
                                    // should not lose their seat over it.
                                    warn!("Invalid message from {}: {}", connection_id, e);
                                    if handler.report_invalid_message().await.is_err() {
                                        break;
                                    }
                                }
                            }
                        } else if message.is_close() {
                            info!("WebSocket closed by client: {}", connection_id);
                            break;
                        }
                    }
                    Err(e) => {
                        error!("WebSocket error for {}: {}", connection_id, e);
                        break;
                    }
                }
            }
        })
    };

    tokio::select! {
        _ = outgoing_task => {},
        _ = incoming_task => {},
    }

    handler.handle_disconnect().await;
    coordinator
        .connections()
        .remove_connection(connection_id)
        .await;
    info!("WebSocket connection closed: {}", connection_id);
}
