pub mod beat_map;
pub mod song;

pub use beat_map::{BeatMap, BeatMapLoader, LANE_COUNT, NoteEvent};
pub use song::{Difficulty, HouseDef, HouseNumber, SongCatalog, SongRef, default_houses};
