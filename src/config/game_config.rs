use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::audio::DEFAULT_CAROL_VOLUME;
use crate::model::song::{HouseDef, SongCatalog, default_houses};
use crate::play::judge::JudgeWindow;
use crate::state::caroling::SessionSettings;
use crate::traits::input::LaneKeyBindings;
use crate::traits::time::ms_to_us;

const CONFIG_FILE: &str = "caroling.json";

/// Top-level configuration for the caroling minigame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    /// Directory song and beat map paths are resolved against.
    pub asset_root: PathBuf,
    /// Fixed RNG seed for song rotation and starting satisfaction.
    pub seed: Option<u64>,
    pub audio: AudioSettings,
    pub timing: TimingSettings,
    pub run: RunSettings,
    /// Keyboard keys for lanes 0..=3.
    pub lane_keys: [char; 4],
    pub houses: Vec<HouseDef>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            seed: None,
            audio: AudioSettings::default(),
            timing: TimingSettings::default(),
            run: RunSettings::default(),
            lane_keys: ['A', 'S', 'K', 'L'],
            houses: default_houses(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSettings {
    /// Carol gain (0.0 - 1.0).
    pub carol_volume: f32,
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            carol_volume: DEFAULT_CAROL_VOLUME,
            muted: false,
        }
    }
}

/// Session timing. Distances are in track units along the note highway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingSettings {
    /// Fall time from spawn to the hit line.
    pub lead_ms: u64,
    pub track_length: f64,
    pub perfect_distance: f64,
    pub good_distance: f64,
    /// Outer edge of the hit window.
    pub hit_distance: f64,
    pub countdown_steps: u32,
    pub countdown_tick_ms: u64,
    /// Settle time between the completion check passing and the session ending.
    pub finish_delay_ms: u64,
    /// How close to the song's end playback must be to complete without an end notification.
    pub completion_grace_ms: u64,
    /// Time after the last note's target before the session is force-ended.
    pub safety_margin_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            lead_ms: 2000,
            track_length: 600.0,
            perfect_distance: 30.0,
            good_distance: 60.0,
            hit_distance: 120.0,
            countdown_steps: 3,
            countdown_tick_ms: 1000,
            finish_delay_ms: 500,
            completion_grace_ms: 1000,
            safety_margin_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunSettings {
    pub max_lives: u32,
    /// Cumulative score that unlocks the village exit.
    pub exit_score: u32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_lives: 3,
            exit_score: 15500,
        }
    }
}

impl GameConfig {
    /// Loads config from the default config file.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Loads and validates config from a specified path.
    /// Returns default config if file doesn't exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves config to a specified path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.timing;
        if t.lead_ms == 0 {
            bail!("timing.lead_ms must be positive");
        }
        if !(t.track_length.is_finite() && t.track_length > 0.0) {
            bail!("timing.track_length must be positive");
        }
        if !(t.hit_distance.is_finite()
            && 0.0 < t.perfect_distance
            && t.perfect_distance <= t.good_distance
            && t.good_distance <= t.hit_distance)
        {
            bail!("judge distances must satisfy 0 < perfect <= good <= hit");
        }
        if !(0.0..=1.0).contains(&self.audio.carol_volume) {
            bail!("audio.carol_volume must be within 0.0..=1.0");
        }
        if self.run.max_lives == 0 {
            bail!("run.max_lives must be at least 1");
        }
        let mut seen = Vec::new();
        for house in &self.houses {
            if seen.contains(&house.number) {
                bail!("house {} is defined twice", house.number);
            }
            seen.push(house.number);
        }
        let keys = self.key_bindings();
        for (lane, key) in self.lane_keys.iter().enumerate() {
            if keys.lane_for(*key) != Some(lane) {
                bail!("lane key {key:?} is bound to more than one lane");
            }
        }
        Ok(())
    }

    pub fn judge_window(&self) -> JudgeWindow {
        let t = &self.timing;
        JudgeWindow::from_track(
            ms_to_us(t.lead_ms),
            t.track_length,
            t.perfect_distance,
            t.good_distance,
            t.hit_distance,
        )
    }

    pub fn session_settings(&self) -> SessionSettings {
        let t = &self.timing;
        SessionSettings {
            lead_us: ms_to_us(t.lead_ms),
            window: self.judge_window(),
            countdown_steps: t.countdown_steps,
            countdown_tick_us: ms_to_us(t.countdown_tick_ms),
            finish_delay_us: ms_to_us(t.finish_delay_ms),
            completion_grace_us: ms_to_us(t.completion_grace_ms),
            safety_margin_us: ms_to_us(t.safety_margin_ms),
        }
    }

    pub fn key_bindings(&self) -> LaneKeyBindings {
        LaneKeyBindings::new(self.lane_keys)
    }

    pub fn catalog(&self) -> SongCatalog {
        SongCatalog::new(self.houses.clone())
    }

    /// Resolve an asset path against `asset_root`. Absolute paths pass through.
    pub fn resolve_asset(&self, path: &Path) -> PathBuf {
        self.asset_root.join(path)
    }
}
