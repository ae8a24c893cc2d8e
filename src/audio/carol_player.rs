use std::path::Path;

use anyhow::Result;
use log::{debug, warn};

use crate::audio::position_tracker::PlaybackTracker;
use crate::traits::audio::{AudioBuffer, AudioOutput, VoiceHandle};
use crate::util::error::AssetLoadError;

/// Default gain for carol playback.
pub const DEFAULT_CAROL_VOLUME: f32 = 0.7;

/// Plays the current carol through an audio output.
///
/// Holds at most one voice. Starting a new voice stops the previous one, and
/// end notifications for any voice other than the current one are ignored.
pub struct CarolPlayer<A: AudioOutput> {
    output: A,
    volume: f32,
    muted: bool,
    buffer: Option<AudioBuffer>,
    voice: Option<VoiceHandle>,
    tracker: PlaybackTracker,
}

impl<A: AudioOutput> CarolPlayer<A> {
    pub fn new(output: A) -> Self {
        Self {
            output,
            volume: DEFAULT_CAROL_VOLUME,
            muted: false,
            buffer: None,
            voice: None,
            tracker: PlaybackTracker::new(),
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn load(&mut self, path: &Path) -> Result<AudioBuffer, AssetLoadError> {
        self.output.load_buffer(path)
    }

    /// Start `buffer` at `offset_us`, replacing whatever was playing.
    pub fn play(&mut self, buffer: AudioBuffer, offset_us: i64, now_us: i64) -> Result<()> {
        self.stop()?;
        let gain = self.gain();
        let voice = self.output.play(&buffer, offset_us, gain)?;
        debug!("Carol voice {:?} started at offset {}us", voice, offset_us);
        self.voice = Some(voice);
        self.buffer = Some(buffer);
        self.tracker.start(offset_us, now_us);
        Ok(())
    }

    /// Stop the voice and freeze the position. No-op unless playing.
    pub fn pause(&mut self, now_us: i64) -> Result<()> {
        if !self.tracker.is_running() {
            return Ok(());
        }
        let offset = self.tracker.pause(now_us);
        if let Some(voice) = self.voice.take() {
            self.output.stop(voice)?;
        }
        debug!("Carol paused at {}us", offset);
        Ok(())
    }

    /// Restart from the frozen position with a fresh voice.
    pub fn resume(&mut self, now_us: i64) -> Result<()> {
        if !self.tracker.is_paused() {
            return Ok(());
        }
        let Some(buffer) = self.buffer.as_ref() else {
            return Ok(());
        };
        let offset = self.tracker.elapsed(now_us);
        self.tracker.resume(now_us);
        if offset >= buffer.duration_us {
            return Ok(());
        }
        let gain = if self.muted { 0.0 } else { self.volume };
        let voice = self.output.play(buffer, offset, gain)?;
        self.voice = Some(voice);
        debug!("Carol resumed at {}us as {:?}", offset, voice);
        Ok(())
    }

    /// Stop playback and forget the current song.
    pub fn stop(&mut self) -> Result<()> {
        self.buffer = None;
        self.tracker.reset();
        if let Some(voice) = self.voice.take() {
            self.output.stop(voice)?;
        }
        Ok(())
    }

    /// Whether the current voice reached the end of its buffer since the last poll.
    pub fn poll_ended(&mut self) -> bool {
        let mut ended = false;
        for voice in self.output.take_finished() {
            if Some(voice) == self.voice {
                self.voice = None;
                ended = true;
            } else {
                debug!("Ignoring end of stale voice {:?}", voice);
            }
        }
        ended
    }

    pub fn position_us(&self, now_us: i64) -> i64 {
        self.tracker.elapsed(now_us)
    }

    pub fn duration_us(&self) -> Option<i64> {
        self.buffer.as_ref().map(|b| b.duration_us)
    }

    pub fn is_playing(&self) -> bool {
        self.voice.is_some()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Change the volume, applying it to the live voice.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.apply_gain();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_gain();
    }

    pub fn output(&self) -> &A {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut A {
        &mut self.output
    }

    pub fn into_output(self) -> A {
        self.output
    }

    fn gain(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    fn apply_gain(&mut self) {
        if let Some(voice) = self.voice {
            let gain = self.gain();
            if let Err(e) = self.output.set_gain(voice, gain) {
                warn!("Failed to set carol gain: {e:#}");
            }
        }
    }
}
