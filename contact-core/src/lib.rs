pub mod game;
pub mod judgment;
pub mod matching;
pub mod scoring;

pub use game::*;
pub use judgment::*;
pub use matching::*;
pub use scoring::*;
