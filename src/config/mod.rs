mod game_config;

pub use game_config::{AudioSettings, GameConfig, RunSettings, TimingSettings};
