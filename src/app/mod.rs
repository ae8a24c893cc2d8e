mod controller;

pub use controller::{CarolingGame, CompletionCallback, HouseOutcome, SessionHandle};
