use anyhow::Result;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::audio::CarolPlayer;
use crate::config::GameConfig;
use crate::model::beat_map::BeatMapLoader;
use crate::model::song::HouseNumber;
use crate::run::{ProgressSnapshot, RunOutcome, RunProgress};
use crate::state::caroling::{
    CarolingSession, SessionChart, SessionEvent, SessionResult, SessionSetup,
};
use crate::state::game_state::Scene;
use crate::traits::audio::AudioOutput;
use crate::traits::input::{KeyEvent, LaneKeyBindings};
use crate::util::error::{BeatMapError, SessionError};

/// Invoked exactly once when a session ends.
pub type CompletionCallback = Box<dyn FnOnce(&HouseOutcome)>;

/// Everything the overworld needs after a house's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseOutcome {
    pub result: SessionResult,
    /// Run state after the result was recorded.
    pub progress: ProgressSnapshot,
    /// The player lost a life and goes back to the village spawn point.
    pub need_respawn: bool,
    pub game_over: bool,
}

impl HouseOutcome {
    pub fn house(&self) -> HouseNumber {
        self.result.house
    }

    pub fn success(&self) -> bool {
        self.result.success
    }
}

/// Identifies a started session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    pub house: HouseNumber,
    pub serial: u64,
}

struct ActiveSession<A: AudioOutput> {
    handle: SessionHandle,
    session: CarolingSession<A>,
    callback: Option<CompletionCallback>,
}

/// House selection API: owns the run, the audio and at most one session.
pub struct CarolingGame<A: AudioOutput> {
    config: GameConfig,
    keys: LaneKeyBindings,
    progress: RunProgress,
    /// `None` while a session holds the player.
    player: Option<CarolPlayer<A>>,
    active: Option<ActiveSession<A>>,
    events: Vec<SessionEvent>,
    last_outcome: Option<HouseOutcome>,
    next_serial: u64,
}

impl<A: AudioOutput> CarolingGame<A> {
    pub fn new(config: GameConfig, output: A) -> Self {
        let mut player = CarolPlayer::new(output).with_volume(config.audio.carol_volume);
        player.set_muted(config.audio.muted);
        let progress = RunProgress::new(config.catalog(), &config.run, config.seed);
        Self {
            keys: config.key_bindings(),
            config,
            progress,
            player: Some(player),
            active: None,
            events: Vec::new(),
            last_outcome: None,
            next_serial: 0,
        }
    }

    /// Start caroling at `house`.
    ///
    /// Asset failures are returned without touching the run. A malformed
    /// beat map still starts a session, which fails at once and costs a life.
    pub fn start_session(
        &mut self,
        house: HouseNumber,
        now_us: i64,
        on_complete: impl FnOnce(&HouseOutcome) + 'static,
    ) -> Result<SessionHandle, SessionError> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyActive);
        }
        if self.progress.is_game_over() {
            return Err(SessionError::GameOver);
        }
        let song = self.progress.select_song(house)?;
        let Some(player) = self.player.as_mut() else {
            return Err(SessionError::AlreadyActive);
        };

        let buffer = player.load(&self.config.resolve_asset(&song.audio))?;
        let chart = match BeatMapLoader::load(&self.config.resolve_asset(&song.beat_map)) {
            Ok(beat_map) => SessionChart::Ready { beat_map, buffer },
            Err(BeatMapError::Malformed { reason, .. }) => SessionChart::Malformed { reason },
            Err(BeatMapError::Asset(e)) => return Err(e.into()),
        };

        let setup = SessionSetup {
            house,
            initial_satisfaction: self.progress.initial_satisfaction(house),
            song,
            settings: self.config.session_settings(),
        };
        let Some(player) = self.player.take() else {
            return Err(SessionError::AlreadyActive);
        };
        let mut session = CarolingSession::new(setup, chart, player);

        self.next_serial += 1;
        let handle = SessionHandle {
            house,
            serial: self.next_serial,
        };
        info!("Starting session {:?} with '{}'", handle, session.song().name);

        if let Err(e) = session.on_enter(now_us) {
            error!("Session failed to start: {e:#}");
            session.abort();
        }
        self.active = Some(ActiveSession {
            handle,
            session,
            callback: Some(Box::new(on_complete)),
        });
        self.finish_if_ended();
        Ok(handle)
    }

    /// Advance the active session to `now_us`. Call once per frame, after input.
    pub fn tick(&mut self, now_us: i64) -> Result<()> {
        if let Some(active) = self.active.as_mut() {
            active.session.on_tick(now_us)?;
        }
        self.finish_if_ended();
        Ok(())
    }

    pub fn on_input(&mut self, event: KeyEvent) -> Result<()> {
        if let Some(active) = self.active.as_mut() {
            active.session.on_input(event)?;
        }
        self.finish_if_ended();
        Ok(())
    }

    /// Route a keyboard key through the lane bindings. Unbound keys are ignored.
    pub fn key_press(&mut self, key: char, now_us: i64) -> Result<()> {
        match self.keys.lane_for(key) {
            Some(lane) => self.on_input(KeyEvent { lane, time_us: now_us }),
            None => Ok(()),
        }
    }

    pub fn pause(&mut self, now_us: i64) -> Result<()> {
        if let Some(active) = self.active.as_mut() {
            active.session.pause(now_us)?;
        }
        self.collect_events();
        Ok(())
    }

    pub fn resume(&mut self, now_us: i64) -> Result<()> {
        if let Some(active) = self.active.as_mut() {
            active.session.resume(now_us)?;
        }
        self.collect_events();
        Ok(())
    }

    /// Leave the house mid-song. Counts as a failure. No-op without a session.
    pub fn end_session(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.session.abort();
        }
        self.finish_if_ended();
    }

    pub fn set_carol_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.config.audio.carol_volume = volume;
        if let Some(player) = self.player_mut() {
            player.set_volume(volume);
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.config.audio.muted = muted;
        if let Some(player) = self.player_mut() {
            player.set_muted(muted);
        }
    }

    /// Start over with full lives. Refused while a session is running.
    pub fn new_run(&mut self) -> Result<(), SessionError> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyActive);
        }
        self.progress.new_run();
        self.last_outcome = None;
        Ok(())
    }

    /// Take all session events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.collect_events();
        std::mem::take(&mut self.events)
    }

    pub fn active_session(&self) -> Option<&CarolingSession<A>> {
        self.active.as_ref().map(|a| &a.session)
    }

    pub fn active_handle(&self) -> Option<SessionHandle> {
        self.active.as_ref().map(|a| a.handle)
    }

    pub fn is_session_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn progress(&self) -> &RunProgress {
        &self.progress
    }

    pub fn can_exit(&self) -> bool {
        self.progress.can_exit()
    }

    pub fn last_outcome(&self) -> Option<&HouseOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn key_bindings(&self) -> &LaneKeyBindings {
        &self.keys
    }

    /// The audio output, wherever the player currently lives.
    pub fn audio(&self) -> Option<&A> {
        match (&self.player, &self.active) {
            (Some(player), _) => Some(player.output()),
            (None, Some(active)) => Some(active.session.player().output()),
            (None, None) => None,
        }
    }

    pub fn audio_mut(&mut self) -> Option<&mut A> {
        self.player_mut().map(|p| p.output_mut())
    }

    fn player_mut(&mut self) -> Option<&mut CarolPlayer<A>> {
        match self.active.as_mut() {
            Some(active) => Some(active.session.player_mut()),
            None => self.player.as_mut(),
        }
    }

    fn collect_events(&mut self) {
        if let Some(active) = self.active.as_mut() {
            self.events.extend(active.session.drain_events());
        }
    }

    /// Record a finished session, hand the audio back and fire its callback.
    fn finish_if_ended(&mut self) {
        self.collect_events();
        if !self.active.as_ref().is_some_and(|a| a.session.is_ended()) {
            return;
        }
        let Some(mut active) = self.active.take() else {
            return;
        };
        let Some(result) = active.session.result().cloned() else {
            warn!("Session {:?} ended without a result", active.handle);
            self.player = Some(active.session.into_player());
            return;
        };
        active.session.on_exit();
        self.player = Some(active.session.into_player());

        let run_outcome = self
            .progress
            .record_result(result.house, result.success, result.score);
        let outcome = HouseOutcome {
            result,
            progress: self.progress.snapshot(),
            need_respawn: matches!(run_outcome, RunOutcome::LifeLost { .. }),
            game_over: matches!(run_outcome, RunOutcome::GameOver),
        };

        if let Some(callback) = active.callback.take() {
            callback(&outcome);
        }
        self.last_outcome = Some(outcome);
    }
}
