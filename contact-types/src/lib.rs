pub mod game;
pub mod ids;
pub mod messages;
pub mod room;

// Re-export all types
pub use game::*;
pub use ids::*;
pub use messages::*;
pub use room::*;
