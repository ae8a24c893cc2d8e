//! Carol playback on top of an [`AudioOutput`](crate::traits::audio::AudioOutput).
//!
//! This module provides:
//! - [`PlaybackTracker`]: wall-clock position tracking with pause/resume
//! - [`CarolPlayer`]: the single-voice carol player used by sessions

mod carol_player;
mod position_tracker;

pub use carol_player::{CarolPlayer, DEFAULT_CAROL_VOLUME};
pub use position_tracker::PlaybackTracker;
