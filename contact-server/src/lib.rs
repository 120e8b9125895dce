use std::sync::Arc;

use serde::Deserialize;
use warp::http::StatusCode;
use warp::Filter;

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod session;
pub mod websocket;

pub use config::Config;
pub use coordinator::GameCoordinator;
pub use errors::{CoordinatorError, CoordinatorResult};

use contact_types::room::{PlayerRole, RoomStatus};

#[derive(Debug, Deserialize)]
struct CreateRoomRequest {
    player_id: String,
    nickname: String,
}

#[derive(Debug, Deserialize)]
struct JoinRoomRequest {
    player_id: String,
    nickname: String,
}

#[derive(Debug, Deserialize)]
struct UpdateSettingsRequest {
    requested_by: String,
    #[serde(default)]
    round_time_minutes: Option<u32>,
    #[serde(default)]
    wordmaster_guess_limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct UpdateRoleRequest {
    #[serde(default)]
    role: Option<PlayerRole>,
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    requested_by: String,
    status: RoomStatus,
}

#[derive(Debug, Deserialize)]
struct CreateGameRequest {
    room_id: String,
    player_id: String,
    target_word: String,
    #[serde(default)]
    word_type: Option<String>,
}

/// `?requested_by=` for the DELETE endpoints, which carry no body.
#[derive(Debug, Deserialize)]
struct RequesterQuery {
    #[serde(default)]
    requested_by: Option<String>,
}

/// `?player_id=` lets a seated player fetch their own view of a game over
/// REST. Identity is client-claimed here, same as everywhere else on this
/// surface; the room code is the only gate a party game needs.
#[derive(Debug, Deserialize)]
struct ViewerQuery {
    #[serde(default)]
    player_id: Option<String>,
}

pub fn create_routes(
    coordinator: Arc<GameCoordinator>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"]);

    let with_coordinator = {
        let coordinator = coordinator.clone();
        warp::any().map(move || coordinator.clone())
    };

    // WebSocket endpoint
    let ws_route = warp::path("ws")
        .and(warp::ws())
        .and(with_coordinator.clone())
        .map(|ws: warp::ws::Ws, coordinator: Arc<GameCoordinator>| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, coordinator))
        });

    // Health check endpoint
    let health_route =
        warp::path("health").map(|| warp::reply::with_status("OK", StatusCode::OK));

    // Room endpoints
    let create_room = warp::path!("api" / "rooms")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_coordinator.clone())
        .and_then(handle_create_room);

    let get_room = warp::path!("api" / "rooms" / String)
        .and(warp::get())
        .and(with_coordinator.clone())
        .and_then(handle_get_room);

    let close_room = warp::path!("api" / "rooms" / String)
        .and(warp::delete())
        .and(warp::query::<RequesterQuery>())
        .and(with_coordinator.clone())
        .and_then(handle_close_room);

    let join_room = warp::path!("api" / "rooms" / String / "players")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_coordinator.clone())
        .and_then(handle_join_room);

    let remove_player = warp::path!("api" / "rooms" / String / "players" / String)
        .and(warp::delete())
        .and(warp::query::<RequesterQuery>())
        .and(with_coordinator.clone())
        .and_then(handle_remove_player);

    let update_role = warp::path!("api" / "rooms" / String / "players" / String / "role")
        .and(warp::put())
        .and(warp::body::json())
        .and(with_coordinator.clone())
        .and_then(handle_update_role);

    let update_settings = warp::path!("api" / "rooms" / String / "settings")
        .and(warp::put())
        .and(warp::body::json())
        .and(with_coordinator.clone())
        .and_then(handle_update_settings);

    let update_status = warp::path!("api" / "rooms" / String / "status")
        .and(warp::put())
        .and(warp::body::json())
        .and(with_coordinator.clone())
        .and_then(handle_update_status);

    // Game endpoints. The by-room routes sit ahead of the by-id route so
    // "room" never parses as a game id.
    let create_game = warp::path!("api" / "games")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_coordinator.clone())
        .and_then(handle_create_game);

    let room_games = warp::path!("api" / "games" / "room" / String)
        .and(warp::get())
        .and(with_coordinator.clone())
        .and_then(handle_room_games);

    let active_game = warp::path!("api" / "games" / "room" / String / "active")
        .and(warp::get())
        .and(with_coordinator.clone())
        .and_then(handle_active_game);

    let get_game = warp::path!("api" / "games" / String)
        .and(warp::get())
        .and(warp::query::<ViewerQuery>())
        .and(with_coordinator)
        .and_then(handle_get_game);

    ws_route
        .or(health_route)
        .or(create_room)
        .or(get_room)
        .or(close_room)
        .or(join_room)
        .or(remove_player)
        .or(update_role)
        .or(update_settings)
        .or(update_status)
        .or(create_game)
        .or(room_games)
        .or(active_game)
        .or(get_game)
        .with(cors)
        .with(warp::log("contact_server"))
}

fn error_reply(err: &CoordinatorError) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&serde_json::json!({ "error": err.to_string() })),
        err.status(),
    )
}

fn json_reply<T: serde::Serialize>(
    value: &T,
    status: StatusCode,
) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(value), status)
}

async fn handle_create_room(
    request: CreateRoomRequest,
    coordinator: Arc<GameCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match coordinator
        .create_room(&request.player_id, &request.nickname)
        .await
    {
        Ok(room) => Ok(json_reply(&room, StatusCode::CREATED)),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_get_room(
    room_id: String,
    coordinator: Arc<GameCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match coordinator.get_room(&room_id).await {
        Ok(room) => Ok(json_reply(&room, StatusCode::OK)),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_close_room(
    room_id: String,
    query: RequesterQuery,
    coordinator: Arc<GameCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let Some(requested_by) = query.requested_by else {
        return Ok(error_reply(&CoordinatorError::validation(
            "requested_by is required",
        )));
    };
    match coordinator.delete_room(&room_id, &requested_by).await {
        Ok(()) => Ok(json_reply(
            &serde_json::json!({ "closed": true }),
            StatusCode::OK,
        )),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_join_room(
    room_id: String,
    request: JoinRoomRequest,
    coordinator: Arc<GameCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match coordinator
        .join_room(&room_id, &request.player_id, &request.nickname)
        .await
    {
        Ok(room) => Ok(json_reply(&room, StatusCode::OK)),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_remove_player(
    room_id: String,
    player_id: String,
    query: RequesterQuery,
    coordinator: Arc<GameCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let Some(requested_by) = query.requested_by else {
        return Ok(error_reply(&CoordinatorError::validation(
            "requested_by is required",
        )));
    };
    match coordinator
        .leave_room(&room_id, &player_id, &requested_by)
        .await
    {
        // Body is the updated room, or null when the last seat emptied and
        // the room was torn down with it.
        Ok(room) => Ok(json_reply(&room, StatusCode::OK)),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_update_role(
    room_id: String,
    player_id: String,
    request: UpdateRoleRequest,
    coordinator: Arc<GameCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match coordinator
        .set_player_role(&room_id, &player_id, request.role)
        .await
    {
        Ok(room) => Ok(json_reply(&room, StatusCode::OK)),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_update_settings(
    room_id: String,
    request: UpdateSettingsRequest,
    coordinator: Arc<GameCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match coordinator
        .update_settings(
            &room_id,
            &request.requested_by,
            request.round_time_minutes,
            request.wordmaster_guess_limit,
        )
        .await
    {
        Ok(room) => Ok(json_reply(&room, StatusCode::OK)),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_update_status(
    room_id: String,
    request: UpdateStatusRequest,
    coordinator: Arc<GameCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match coordinator
        .set_room_status(&room_id, &request.requested_by, request.status)
        .await
    {
        Ok(room) => Ok(json_reply(&room, StatusCode::OK)),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_create_game(
    request: CreateGameRequest,
    coordinator: Arc<GameCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let word_type = request.word_type.as_deref().unwrap_or("word");
    match coordinator
        .create_game(
            &request.room_id,
            &request.player_id,
            &request.target_word,
            word_type,
        )
        .await
    {
        // The requester is the wordmaster, so their view keeps the target
        // word they just chose.
        Ok(game) => Ok(json_reply(
            &game.view_for(Some(&request.player_id)),
            StatusCode::CREATED,
        )),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_get_game(
    game_id: String,
    query: ViewerQuery,
    coordinator: Arc<GameCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match coordinator.get_game(&game_id).await {
        Ok(game) => Ok(json_reply(
            &game.view_for(query.player_id.as_deref()),
            StatusCode::OK,
        )),
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_room_games(
    room_id: String,
    coordinator: Arc<GameCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match coordinator.room_games(&room_id).await {
        Ok(games) => {
            let views: Vec<_> = games.iter().map(|game| game.spectator_view()).collect();
            Ok(json_reply(&views, StatusCode::OK))
        }
        Err(err) => Ok(error_reply(&err)),
    }
}

async fn handle_active_game(
    room_id: String,
    coordinator: Arc<GameCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match coordinator.active_game(&room_id).await {
        Ok(game) => Ok(json_reply(
            &game.map(|game| game.spectator_view()),
            StatusCode::OK,
        )),
        Err(err) => Ok(error_reply(&err)),
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use contact_store::MemoryStore;
    use contact_types::messages::ServerMessage;
    use contact_types::room::Room;
    use websocket::ConnectionManager;

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_players_per_room: 4,
            default_round_time_minutes: 2,
            default_wordmaster_guess_limit: 3,
            disconnect_grace_seconds: 0,
            connection_timeout_seconds: 300,
            room_idle_minutes: 60,
        }
    }

    fn test_coordinator() -> Arc<GameCoordinator> {
        let store = Arc::new(MemoryStore::with_max_players(4));
        Arc::new(GameCoordinator::new(
            store.clone(),
            store,
            Arc::new(ConnectionManager::new()),
            test_config(),
        ))
    }

    fn room_from(body: &[u8]) -> Room {
        serde_json::from_slice(body).expect("response should be a room")
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_routes(test_coordinator());

        let res = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&app)
            .await;

        assert_eq!(res.status(), 200);
        assert_eq!(res.body(), "OK");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = create_routes(test_coordinator());

        let res = warp::test::request()
            .method("OPTIONS")
            .path("/api/rooms")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .reply(&app)
            .await;

        assert_eq!(res.status(), 200);
    }

    #[tokio::test]
    async fn test_invalid_route_returns_404() {
        let app = create_routes(test_coordinator());

        let res = warp::test::request()
            .method("GET")
            .path("/api/nonexistent")
            .reply(&app)
            .await;

        assert_eq!(res.status(), 404);
    }

    #[tokio::test]
    async fn test_create_and_fetch_room() {
        let app = create_routes(test_coordinator());

        let res = warp::test::request()
            .method("POST")
            .path("/api/rooms")
            .json(&serde_json::json!({ "player_id": "p1", "nickname": "Ana" }))
            .reply(&app)
            .await;

        assert_eq!(res.status(), 201);
        let room = room_from(res.body());
        assert_eq!(room.admin_id, "p1");
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.room_id.len(), 6);

        let res = warp::test::request()
            .method("GET")
            .path(&format!("/api/rooms/{}", room.room_id))
            .reply(&app)
            .await;

        assert_eq!(res.status(), 200);
        assert_eq!(room_from(res.body()).room_id, room.room_id);
    }

    #[tokio::test]
    async fn test_fetch_missing_room_is_404() {
        let app = create_routes(test_coordinator());

        let res = warp::test::request()
            .method("GET")
            .path("/api/rooms/ZZZZZZ")
            .reply(&app)
            .await;

        assert_eq!(res.status(), 404);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert!(body["error"].as_str().unwrap().contains("ZZZZZZ"));
    }

    #[tokio::test]
    async fn test_join_room_via_rest() {
        let app = create_routes(test_coordinator());

        let res = warp::test::request()
            .method("POST")
            .path("/api/rooms")
            .json(&serde_json::json!({ "player_id": "p1", "nickname": "Ana" }))
            .reply(&app)
            .await;
        let room = room_from(res.body());

        let res = warp::test::request()
            .method("POST")
            .path(&format!("/api/rooms/{}/players", room.room_id))
            .json(&serde_json::json!({ "player_id": "p2", "nickname": "Ben" }))
            .reply(&app)
            .await;

        assert_eq!(res.status(), 200);
        assert_eq!(room_from(res.body()).players.len(), 2);
    }

    #[tokio::test]
    async fn test_join_full_room_conflicts() {
        let app = create_routes(test_coordinator());

        let res = warp::test::request()
            .method("POST")
            .path("/api/rooms")
            .json(&serde_json::json!({ "player_id": "p1", "nickname": "Ana" }))
            .reply(&app)
            .await;
        let room = room_from(res.body());

        for (id, nick) in [("p2", "Ben"), ("p3", "Cal"), ("p4", "Dee")] {
            let res = warp::test::request()
                .method("POST")
                .path(&format!("/api/rooms/{}/players", room.room_id))
                .json(&serde_json::json!({ "player_id": id, "nickname": nick }))
                .reply(&app)
                .await;
            assert_eq!(res.status(), 200);
        }

        let res = warp::test::request()
            .method("POST")
            .path(&format!("/api/rooms/{}/players", room.room_id))
            .json(&serde_json::json!({ "player_id": "p5", "nickname": "Eve" }))
            .reply(&app)
            .await;

        assert_eq!(res.status(), 409);
    }

    #[tokio::test]
    async fn test_kick_requires_admin() {
        let app = create_routes(test_coordinator());

        let res = warp::test::request()
            .method("POST")
            .path("/api/rooms")
            .json(&serde_json::json!({ "player_id": "p1", "nickname": "Ana" }))
            .reply(&app)
            .await;
        let room = room_from(res.body());

        warp::test::request()
            .method("POST")
            .path(&format!("/api/rooms/{}/players", room.room_id))
            .json(&serde_json::json!({ "player_id": "p2", "nickname": "Ben" }))
            .reply(&app)
            .await;

        let res = warp::test::request()
            .method("DELETE")
            .path(&format!(
                "/api/rooms/{}/players/p1?requested_by=p2",
                room.room_id
            ))
            .reply(&app)
            .await;

        assert_eq!(res.status(), 403);
    }

    #[tokio::test]
    async fn test_last_player_leaving_tears_down_room() {
        let app = create_routes(test_coordinator());

        let res = warp::test::request()
            .method("POST")
            .path("/api/rooms")
            .json(&serde_json::json!({ "player_id": "p1", "nickname": "Ana" }))
            .reply(&app)
            .await;
        let room = room_from(res.body());

        let res = warp::test::request()
            .method("DELETE")
            .path(&format!(
                "/api/rooms/{}/players/p1?requested_by=p1",
                room.room_id
            ))
            .reply(&app)
            .await;

        assert_eq!(res.status(), 200);
        assert_eq!(res.body(), "null");

        let res = warp::test::request()
            .method("GET")
            .path(&format!("/api/rooms/{}", room.room_id))
            .reply(&app)
            .await;
        assert_eq!(res.status(), 404);
    }

    #[tokio::test]
    async fn test_settings_update_requires_admin() {
        let app = create_routes(test_coordinator());

        let res = warp::test::request()
            .method("POST")
            .path("/api/rooms")
            .json(&serde_json::json!({ "player_id": "p1", "nickname": "Ana" }))
            .reply(&app)
            .await;
        let room = room_from(res.body());

        warp::test::request()
            .method("POST")
            .path(&format!("/api/rooms/{}/players", room.room_id))
            .json(&serde_json::json!({ "player_id": "p2", "nickname": "Ben" }))
            .reply(&app)
            .await;

        let res = warp::test::request()
            .method("PUT")
            .path(&format!("/api/rooms/{}/settings", room.room_id))
            .json(&serde_json::json!({ "requested_by": "p2", "round_time_minutes": 5 }))
            .reply(&app)
            .await;
        assert_eq!(res.status(), 403);

        let res = warp::test::request()
            .method("PUT")
            .path(&format!("/api/rooms/{}/settings", room.room_id))
            .json(&serde_json::json!({ "requested_by": "p1", "round_time_minutes": 5 }))
            .reply(&app)
            .await;
        assert_eq!(res.status(), 200);
        assert_eq!(room_from(res.body()).settings.round_time_minutes, 5);
    }

    #[tokio::test]
    async fn test_starting_needs_roles_and_ready_players() {
        let app = create_routes(test_coordinator());

        let res = warp::test::request()
            .method("POST")
            .path("/api/rooms")
            .json(&serde_json::json!({ "player_id": "p1", "nickname": "Ana" }))
            .reply(&app)
            .await;
        let room = room_from(res.body());

        for (id, nick) in [("p2", "Ben"), ("p3", "Cal")] {
            warp::test::request()
                .method("POST")
                .path(&format!("/api/rooms/{}/players", room.room_id))
                .json(&serde_json::json!({ "player_id": id, "nickname": nick }))
                .reply(&app)
                .await;
        }

        // No roles picked yet.
        let res = warp::test::request()
            .method("PUT")
            .path(&format!("/api/rooms/{}/status", room.room_id))
            .json(&serde_json::json!({ "requested_by": "p1", "status": "starting" }))
            .reply(&app)
            .await;
        assert_eq!(res.status(), 400);

        for (id, role) in [("p1", "wordmaster"), ("p2", "guesser"), ("p3", "guesser")] {
            let res = warp::test::request()
                .method("PUT")
                .path(&format!("/api/rooms/{}/players/{}/role", room.room_id, id))
                .json(&serde_json::json!({ "role": role }))
                .reply(&app)
                .await;
            assert_eq!(res.status(), 200);
        }

        // Roles set, but nobody is ready.
        let res = warp::test::request()
            .method("PUT")
            .path(&format!("/api/rooms/{}/status", room.room_id))
            .json(&serde_json::json!({ "requested_by": "p1", "status": "starting" }))
            .reply(&app)
            .await;
        assert_eq!(res.status(), 400);
    }

    #[tokio::test]
    async fn test_create_game_requires_starting_room() {
        let app = create_routes(test_coordinator());

        let res = warp::test::request()
            .method("POST")
            .path("/api/rooms")
            .json(&serde_json::json!({ "player_id": "p1", "nickname": "Ana" }))
            .reply(&app)
            .await;
        let room = room_from(res.body());

        let res = warp::test::request()
            .method("POST")
            .path("/api/games")
            .json(&serde_json::json!({
                "room_id": room.room_id,
                "player_id": "p1",
                "target_word": "HARMONY"
            }))
            .reply(&app)
            .await;

        assert_eq!(res.status(), 400);
    }

    #[tokio::test]
    async fn test_room_games_listing_starts_empty() {
        let app = create_routes(test_coordinator());

        let res = warp::test::request()
            .method("POST")
            .path("/api/rooms")
            .json(&serde_json::json!({ "player_id": "p1", "nickname": "Ana" }))
            .reply(&app)
            .await;
        let room = room_from(res.body());

        let res = warp::test::request()
            .method("GET")
            .path(&format!("/api/games/room/{}", room.room_id))
            .reply(&app)
            .await;
        assert_eq!(res.status(), 200);
        let games: Vec<serde_json::Value> = serde_json::from_slice(res.body()).unwrap();
        assert!(games.is_empty());

        let res = warp::test::request()
            .method("GET")
            .path(&format!("/api/games/room/{}/active", room.room_id))
            .reply(&app)
            .await;
        assert_eq!(res.status(), 200);
        assert_eq!(res.body(), "null");
    }

    #[tokio::test]
    async fn test_websocket_connection() {
        let coordinator = test_coordinator();
        let app = create_routes(coordinator);

        let mut client = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("handshake should succeed");

        // A join for a room the player never entered over REST is refused.
        client
            .send_text(
                serde_json::json!({
                    "type": "join_room",
                    "room_id": "ZZZZZZ",
                    "player_id": "p1",
                    "nickname": "Ana"
                })
                .to_string(),
            )
            .await;

        let msg = client.recv().await.expect("server should reply");
        let parsed: ServerMessage = serde_json::from_str(msg.to_str().unwrap()).unwrap();
        match parsed {
            ServerMessage::Error { message } => {
                assert!(message.contains("lobby"), "unexpected error: {}", message)
            }
            other => panic!("expected an error notice, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_websocket_join_after_rest_join() {
        let coordinator = test_coordinator();
        let app = create_routes(coordinator.clone());

        let res = warp::test::request()
            .method("POST")
            .path("/api/rooms")
            .json(&serde_json::json!({ "player_id": "p1", "nickname": "Ana" }))
            .reply(&app)
            .await;
        let room = room_from(res.body());

        let mut client = warp::test::ws()
            .path("/ws")
            .handshake(create_routes(coordinator))
            .await
            .expect("handshake should succeed");

        client
            .send_text(
                serde_json::json!({
                    "type": "join_room",
                    "room_id": room.room_id,
                    "player_id": "p1",
                    "nickname": "Ana"
                })
                .to_string(),
            )
            .await;

        let msg = client.recv().await.expect("server should reply");
        let parsed: ServerMessage = serde_json::from_str(msg.to_str().unwrap()).unwrap();
        match parsed {
            ServerMessage::SessionEstablished {
                player_id,
                room_id,
                nickname,
                session_token,
            } => {
                assert_eq!(player_id, "p1");
                assert_eq!(room_id, room.room_id);
                assert_eq!(nickname, "Ana");
                assert!(!session_token.is_empty());
            }
            other => panic!("expected session_established, got {:?}", other),
        }

        let msg = client.recv().await.expect("room snapshot should follow");
        let parsed: ServerMessage = serde_json::from_str(msg.to_str().unwrap()).unwrap();
        assert!(matches!(parsed, ServerMessage::RoomUpdated { .. }));
    }

    #[tokio::test]
    async fn test_websocket_rejects_unparseable_message() {
        let coordinator = test_coordinator();
        let app = create_routes(coordinator);

        let mut client = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("handshake should succeed");

        client.send_text("this is not json").await;

        let msg = client.recv().await.expect("server should reply");
        let parsed: ServerMessage = serde_json::from_str(msg.to_str().unwrap()).unwrap();
        match parsed {
            ServerMessage::Error { message } => assert_eq!(message, "Unrecognized message"),
            other => panic!("expected an error notice, got {:?}", other),
        }
    }
}
