//! Test utilities for building beat maps and sessions.
//!
//! This module provides helpers for creating test fixtures in a fluent manner.

#[cfg(test)]
pub mod builders {
    use std::path::Path;

    use crate::audio::CarolPlayer;
    use crate::model::beat_map::{BeatMap, NoteEvent};
    use crate::model::song::SongRef;
    use crate::state::caroling::{CarolingSession, SessionChart, SessionSettings, SessionSetup};
    use crate::traits::audio::MockAudio;

    /// Builder for creating test beat maps.
    #[derive(Debug, Default)]
    pub struct BeatMapBuilder {
        notes: Vec<NoteEvent>,
    }

    impl BeatMapBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a note with the default visual duration.
        pub fn note(mut self, lane: usize, time_us: i64) -> Self {
            self.notes.push(NoteEvent::new(lane, time_us));
            self
        }

        /// Add `count` notes in `lane`, `interval_us` apart, starting at `first_us`.
        pub fn stream(mut self, lane: usize, first_us: i64, interval_us: i64, count: usize) -> Self {
            for i in 0..count {
                self.notes
                    .push(NoteEvent::new(lane, first_us + i as i64 * interval_us));
            }
            self
        }

        pub fn build(self) -> BeatMap {
            BeatMap::new(self.notes)
        }
    }

    /// Session over `beat_map` with a mock song of `song_us`, not yet entered.
    pub fn mock_session(
        beat_map: BeatMap,
        song_us: i64,
        initial_satisfaction: i32,
    ) -> CarolingSession<MockAudio> {
        let mut player = CarolPlayer::new(MockAudio::new().with_buffer("carol.mp3", song_us));
        let buffer = player
            .load(Path::new("carol.mp3"))
            .expect("mock buffer is registered");
        CarolingSession::new(
            SessionSetup {
                house: 1,
                song: SongRef::new("Test Carol", "carol.mp3", "carol.json"),
                initial_satisfaction,
                settings: SessionSettings::default(),
            },
            SessionChart::Ready { beat_map, buffer },
            player,
        )
    }
}
