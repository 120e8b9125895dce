/// Identifiers keep the client-facing string form from the wire protocol.
/// Room ids double as the six character join code shown in the lobby.
pub type PlayerId = String;
pub type RoomId = String;
pub type GameId = String;

/// Opaque token handed out on join, used to resume a session after a socket
/// drop without trusting a client-claimed player id.
pub type SessionToken = String;
