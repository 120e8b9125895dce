use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use contact_server::websocket::ConnectionManager;
use contact_server::{create_routes, Config, GameCoordinator};
use contact_store::MemoryStore;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Contact server...");

    let config = Config::new();
    let store = Arc::new(MemoryStore::with_max_players(config.max_players_per_room));
    let connection_manager = Arc::new(ConnectionManager::new());
    let coordinator = Arc::new(GameCoordinator::new(
        store.clone(),
        store,
        connection_manager.clone(),
        config.clone(),
    ));

    let routes = create_routes(coordinator.clone());

    // Reap sockets that never joined a room and rooms nobody came back to.
    let cleanup_connections = connection_manager.clone();
    let cleanup_coordinator = coordinator.clone();
    let connection_timeout = Duration::from_secs(config.connection_timeout_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            cleanup_connections
                .cleanup_inactive_connections(connection_timeout)
                .await;
            cleanup_coordinator.cleanup_idle_rooms().await;
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let addr = (
        config.host.parse::<std::net::IpAddr>().unwrap(),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
