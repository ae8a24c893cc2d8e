use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Result, bail};

use crate::traits::time::TimeProvider;
use crate::util::error::AssetLoadError;

/// Handle for a single playing voice. A new handle is issued for every `play`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceHandle(pub u64);

/// A decoded sound ready for playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    pub id: u64,
    pub duration_us: i64,
}

/// Abstraction over the audio output service.
/// Implementations: SilentAudio (headless), MockAudio (testing).
pub trait AudioOutput {
    fn load_buffer(&mut self, path: &Path) -> Result<AudioBuffer, AssetLoadError>;

    /// Start a new voice at `offset_us` into the buffer with the given gain (0.0..=1.0).
    fn play(&mut self, buffer: &AudioBuffer, offset_us: i64, gain: f32) -> Result<VoiceHandle>;

    fn stop(&mut self, voice: VoiceHandle) -> Result<()>;

    fn set_gain(&mut self, voice: VoiceHandle, gain: f32) -> Result<()>;

    /// Drain voices that reached the end of their buffer since the last call.
    fn take_finished(&mut self) -> Vec<VoiceHandle>;
}

/// Audio output that produces no sound but keeps voice timing against a clock.
///
/// Every path loads as a buffer of the configured duration, so headless runs
/// only need beat maps on disk.
pub struct SilentAudio {
    clock: Rc<dyn TimeProvider>,
    duration_us: i64,
    next_id: u64,
    voices: Vec<(VoiceHandle, i64)>,
}

impl SilentAudio {
    pub fn new(clock: Rc<dyn TimeProvider>, duration_us: i64) -> Self {
        Self {
            clock,
            duration_us,
            next_id: 0,
            voices: Vec::new(),
        }
    }

    fn issue_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl AudioOutput for SilentAudio {
    fn load_buffer(&mut self, _path: &Path) -> Result<AudioBuffer, AssetLoadError> {
        Ok(AudioBuffer {
            id: self.issue_id(),
            duration_us: self.duration_us,
        })
    }

    fn play(&mut self, buffer: &AudioBuffer, offset_us: i64, _gain: f32) -> Result<VoiceHandle> {
        let voice = VoiceHandle(self.issue_id());
        let ends_at = self.clock.now_us() + (buffer.duration_us - offset_us).max(0);
        self.voices.push((voice, ends_at));
        Ok(voice)
    }

    fn stop(&mut self, voice: VoiceHandle) -> Result<()> {
        self.voices.retain(|(v, _)| *v != voice);
        Ok(())
    }

    fn set_gain(&mut self, _voice: VoiceHandle, _gain: f32) -> Result<()> {
        Ok(())
    }

    fn take_finished(&mut self) -> Vec<VoiceHandle> {
        let now = self.clock.now_us();
        let (done, playing): (Vec<_>, Vec<_>) = std::mem::take(&mut self.voices)
            .into_iter()
            .partition(|(_, ends_at)| *ends_at <= now);
        self.voices = playing;
        done.into_iter().map(|(v, _)| v).collect()
    }
}

/// Recorded interaction with `MockAudio`.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Load(PathBuf),
    Play {
        voice: VoiceHandle,
        offset_us: i64,
        gain: f32,
    },
    Stop(VoiceHandle),
    SetGain {
        voice: VoiceHandle,
        gain: f32,
    },
}

/// Scriptable audio output for tests. Voices only finish when told to.
#[derive(Debug, Default)]
pub struct MockAudio {
    durations: HashMap<PathBuf, i64>,
    default_duration_us: Option<i64>,
    next_id: u64,
    active: Vec<VoiceHandle>,
    finished: Vec<VoiceHandle>,
    calls: Vec<AudioCall>,
    fail_play: bool,
    fail_stop: bool,
}

impl MockAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loadable buffer.
    pub fn with_buffer(mut self, path: impl Into<PathBuf>, duration_us: i64) -> Self {
        self.durations.insert(path.into(), duration_us);
        self
    }

    /// Make every unregistered path load with this duration.
    pub fn with_default_duration(mut self, duration_us: i64) -> Self {
        self.default_duration_us = Some(duration_us);
        self
    }

    /// Make every `play` call fail.
    pub fn failing_play(mut self) -> Self {
        self.fail_play = true;
        self
    }

    /// Make every `stop` call fail, leaving the voice playing.
    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn calls(&self) -> &[AudioCall] {
        &self.calls
    }

    pub fn active_voices(&self) -> &[VoiceHandle] {
        &self.active
    }

    pub fn last_voice(&self) -> Option<VoiceHandle> {
        self.calls.iter().rev().find_map(|call| match call {
            AudioCall::Play { voice, .. } => Some(*voice),
            _ => None,
        })
    }

    pub fn play_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, AudioCall::Play { .. }))
            .count()
    }

    /// Report `voice` as having reached the end of its buffer.
    pub fn finish(&mut self, voice: VoiceHandle) {
        self.active.retain(|v| *v != voice);
        self.finished.push(voice);
    }

    fn issue_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl AudioOutput for MockAudio {
    fn load_buffer(&mut self, path: &Path) -> Result<AudioBuffer, AssetLoadError> {
        self.calls.push(AudioCall::Load(path.to_path_buf()));
        let duration_us = self
            .durations
            .get(path)
            .copied()
            .or(self.default_duration_us)
            .ok_or_else(|| AssetLoadError::NotFound {
                path: path.to_path_buf(),
            })?;
        Ok(AudioBuffer {
            id: self.issue_id(),
            duration_us,
        })
    }

    fn play(&mut self, _buffer: &AudioBuffer, offset_us: i64, gain: f32) -> Result<VoiceHandle> {
        if self.fail_play {
            bail!("mock audio device unavailable");
        }
        let voice = VoiceHandle(self.issue_id());
        self.active.push(voice);
        self.calls.push(AudioCall::Play {
            voice,
            offset_us,
            gain,
        });
        Ok(voice)
    }

    fn stop(&mut self, voice: VoiceHandle) -> Result<()> {
        if self.fail_stop {
            bail!("mock audio device refused to stop {voice:?}");
        }
        self.active.retain(|v| *v != voice);
        self.calls.push(AudioCall::Stop(voice));
        Ok(())
    }

    fn set_gain(&mut self, voice: VoiceHandle, gain: f32) -> Result<()> {
        self.calls.push(AudioCall::SetGain { voice, gain });
        Ok(())
    }

    fn take_finished(&mut self) -> Vec<VoiceHandle> {
        std::mem::take(&mut self.finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::time::MockTimeProvider;

    #[test]
    fn mock_audio_unknown_path_is_not_found() {
        let mut audio = MockAudio::new().with_buffer("a.mp3", 1_000_000);
        assert!(audio.load_buffer(Path::new("a.mp3")).is_ok());
        let err = audio.load_buffer(Path::new("b.mp3")).unwrap_err();
        assert!(matches!(err, AssetLoadError::NotFound { .. }));
    }

    #[test]
    fn mock_audio_issues_fresh_handles() {
        let mut audio = MockAudio::new().with_default_duration(1_000_000);
        let buffer = audio.load_buffer(Path::new("x.mp3")).unwrap();
        let a = audio.play(&buffer, 0, 0.7).unwrap();
        let b = audio.play(&buffer, 0, 0.7).unwrap();
        assert_ne!(a, b);
        assert_eq!(audio.play_count(), 2);
        assert_eq!(audio.last_voice(), Some(b));

        audio.finish(a);
        assert_eq!(audio.take_finished(), vec![a]);
        assert!(audio.take_finished().is_empty());
        assert_eq!(audio.active_voices(), &[b]);
    }

    #[test]
    fn silent_audio_finishes_on_clock() {
        let clock = Rc::new(MockTimeProvider::new());
        let mut audio = SilentAudio::new(clock.clone(), 3_000_000);
        let buffer = audio.load_buffer(Path::new("song.mp3")).unwrap();

        let voice = audio.play(&buffer, 1_000_000, 1.0).unwrap();
        clock.set_time(1_999_999);
        assert!(audio.take_finished().is_empty());
        clock.set_time(2_000_000);
        assert_eq!(audio.take_finished(), vec![voice]);
    }

    #[test]
    fn silent_audio_stopped_voice_never_finishes() {
        let clock = Rc::new(MockTimeProvider::new());
        let mut audio = SilentAudio::new(clock.clone(), 1_000_000);
        let buffer = audio.load_buffer(Path::new("song.mp3")).unwrap();
        let voice = audio.play(&buffer, 0, 1.0).unwrap();
        audio.stop(voice).unwrap();
        clock.set_time(5_000_000);
        assert!(audio.take_finished().is_empty());
    }
}
