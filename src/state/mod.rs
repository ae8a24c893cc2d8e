pub mod caroling;
pub mod game_state;

pub use game_state::{Scene, StateTransition};
