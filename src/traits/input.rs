use std::collections::VecDeque;

use crate::model::beat_map::LANE_COUNT;

/// A lane key press at a specific point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Lane index (0-indexed, left to right).
    pub lane: usize,
    /// Wall-clock timestamp in microseconds.
    pub time_us: i64,
}

/// Abstraction over input sources.
/// Implementations: the embedding game's keyboard handler, ScriptedInput (autoplay, testing).
pub trait InputProvider {
    /// Take every press that happened at or before `now_us`.
    fn poll_events(&mut self, now_us: i64) -> Vec<KeyEvent>;
}

/// Keyboard characters bound to each lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneKeyBindings {
    keys: [char; LANE_COUNT],
}

impl LaneKeyBindings {
    pub fn new(keys: [char; LANE_COUNT]) -> Self {
        Self {
            keys: keys.map(|k| k.to_ascii_uppercase()),
        }
    }

    /// Lane for a key character, case-insensitive.
    pub fn lane_for(&self, key: char) -> Option<usize> {
        let key = key.to_ascii_uppercase();
        self.keys.iter().position(|k| *k == key)
    }

    pub fn key_for(&self, lane: usize) -> Option<char> {
        self.keys.get(lane).copied()
    }
}

impl Default for LaneKeyBindings {
    fn default() -> Self {
        Self::new(['A', 'S', 'K', 'L'])
    }
}

/// Pre-recorded presses replayed in time order.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    events: VecDeque<KeyEvent>,
}

impl ScriptedInput {
    pub fn new(mut events: Vec<KeyEvent>) -> Self {
        events.sort_by_key(|e| e.time_us);
        Self {
            events: events.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }

    /// Time of the next pending press.
    pub fn next_time_us(&self) -> Option<i64> {
        self.events.front().map(|e| e.time_us)
    }
}

impl InputProvider for ScriptedInput {
    fn poll_events(&mut self, now_us: i64) -> Vec<KeyEvent> {
        let mut out = Vec::new();
        while let Some(event) = self.events.front() {
            if event.time_us > now_us {
                break;
            }
            out.extend(self.events.pop_front());
        }
        out
    }
}
