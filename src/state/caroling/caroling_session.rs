use anyhow::Result;
use log::{debug, error, info, trace, warn};

use crate::audio::{CarolPlayer, PlaybackTracker};
use crate::model::beat_map::{BeatMap, LANE_COUNT};
use crate::model::song::{HouseNumber, SongRef};
use crate::play::judge::{JudgeWindow, Judgement};
use crate::play::ledger::SatisfactionLedger;
use crate::play::mood::Mood;
use crate::play::note_spawner::{ActiveNote, NoteSpawner};
use crate::state::caroling::events::SessionEvent;
use crate::state::caroling::session_result::{EndReason, SessionResult};
use crate::state::caroling::timer_manager::{DueTimer, TimerKind, TimerManager};
use crate::state::game_state::{Scene, StateTransition};
use crate::traits::audio::{AudioBuffer, AudioOutput};
use crate::traits::input::KeyEvent;

/// Timing parameters for one session, all in microseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Fall time from spawn to the hit line.
    pub lead_us: i64,
    pub window: JudgeWindow,
    /// Countdown shows `countdown_steps`..1 then "GO", one tick each.
    pub countdown_steps: u32,
    pub countdown_tick_us: i64,
    pub finish_delay_us: i64,
    pub completion_grace_us: i64,
    pub safety_margin_us: i64,
}

impl SessionSettings {
    /// Session time at which the song starts, after the countdown and "GO".
    pub fn play_start_offset_us(&self) -> i64 {
        (self.countdown_steps as i64 + 1) * self.countdown_tick_us
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            lead_us: 2_000_000,
            window: JudgeWindow::default(),
            countdown_steps: 3,
            countdown_tick_us: 1_000_000,
            finish_delay_us: 500_000,
            completion_grace_us: 1_000_000,
            safety_margin_us: 5_000_000,
        }
    }
}

/// Phase of a caroling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Countdown,
    Playing,
    Ended,
}

/// What the session will play.
#[derive(Debug, Clone)]
pub enum SessionChart {
    Ready {
        beat_map: BeatMap,
        buffer: AudioBuffer,
    },
    /// The beat map was unusable; the session ends in failure on entry.
    Malformed { reason: String },
}

/// Identity and starting conditions of a session.
#[derive(Debug, Clone)]
pub struct SessionSetup {
    pub house: HouseNumber,
    pub song: SongRef,
    pub initial_satisfaction: i32,
    pub settings: SessionSettings,
}

/// One house's caroling round: countdown, note play and the final result.
///
/// Internally everything runs on a session clock that starts at 0 on entry
/// and stands still while paused. Timers are dispatched in due order using
/// their own due time, so a frame that arrives late still resolves spawns,
/// expiries and presses in the order they happened.
pub struct CarolingSession<A: AudioOutput> {
    house: HouseNumber,
    song: SongRef,
    settings: SessionSettings,
    chart: SessionChart,
    player: CarolPlayer<A>,

    clock: PlaybackTracker,
    phase: SessionPhase,
    paused: bool,
    timers: TimerManager,
    spawner: NoteSpawner,
    ledger: SatisfactionLedger,

    play_start_us: Option<i64>,
    song_ended: bool,
    finish_scheduled: bool,

    events: Vec<SessionEvent>,
    result: Option<SessionResult>,
}

impl<A: AudioOutput> CarolingSession<A> {
    pub fn new(setup: SessionSetup, chart: SessionChart, player: CarolPlayer<A>) -> Self {
        let total_notes = match &chart {
            SessionChart::Ready { beat_map, .. } => beat_map.len() as u32,
            SessionChart::Malformed { .. } => 0,
        };
        let SessionSetup {
            house,
            song,
            initial_satisfaction,
            settings,
        } = setup;

        Self {
            house,
            song,
            spawner: NoteSpawner::new(settings.lead_us, settings.window),
            settings,
            chart,
            player,
            clock: PlaybackTracker::new(),
            phase: SessionPhase::Idle,
            paused: false,
            timers: TimerManager::new(),
            ledger: SatisfactionLedger::new(initial_satisfaction, total_notes),
            play_start_us: None,
            song_ended: false,
            finish_scheduled: false,
            events: Vec::new(),
            result: None,
        }
    }

    pub fn house(&self) -> HouseNumber {
        self.house
    }

    pub fn song(&self) -> &SongRef {
        &self.song
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_ended(&self) -> bool {
        self.phase == SessionPhase::Ended
    }

    pub fn ledger(&self) -> &SatisfactionLedger {
        &self.ledger
    }

    pub fn active_notes(&self) -> &[ActiveNote] {
        self.spawner.active()
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Session clock reading for a wall-clock instant.
    pub fn session_time_us(&self, now_us: i64) -> i64 {
        self.clock.elapsed(now_us)
    }

    /// Song position, 0 before playback starts.
    pub fn song_position_us(&self, now_us: i64) -> i64 {
        if self.player.duration_us().is_some() {
            return self.player.position_us(now_us);
        }
        // Fall back to the session clock when the voice failed to start.
        match self.play_start_us {
            Some(start) if self.phase == SessionPhase::Playing => {
                (self.clock.elapsed(now_us) - start).max(0)
            }
            _ => 0,
        }
    }

    /// Take all events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn player(&self) -> &CarolPlayer<A> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut CarolPlayer<A> {
        &mut self.player
    }

    /// Give the audio back once the session is over.
    pub fn into_player(self) -> CarolPlayer<A> {
        self.player
    }

    /// Freeze the session clock and the song.
    pub fn pause(&mut self, now_us: i64) -> Result<()> {
        if self.paused || !matches!(self.phase, SessionPhase::Countdown | SessionPhase::Playing) {
            return Ok(());
        }
        self.clock.pause(now_us);
        if let Err(e) = self.player.pause(now_us) {
            warn!("Failed to pause carol audio: {e:#}");
        }
        self.paused = true;
        debug!("Session paused at {}us", self.clock.elapsed(now_us));
        self.events.push(SessionEvent::Paused);
        Ok(())
    }

    pub fn resume(&mut self, now_us: i64) -> Result<()> {
        if !self.paused || self.phase == SessionPhase::Ended {
            return Ok(());
        }
        self.clock.resume(now_us);
        if let Err(e) = self.player.resume(now_us) {
            warn!("Failed to resume carol audio: {e:#}");
        }
        self.paused = false;
        debug!("Session resumed at {}us", self.clock.elapsed(now_us));
        self.events.push(SessionEvent::Resumed);
        Ok(())
    }

    /// End the session as a failure because the player left. Idempotent.
    pub fn abort(&mut self) {
        self.end(EndReason::Aborted, false);
    }

    fn transition(&self) -> StateTransition {
        match self.result.as_ref().map(|r| r.reason) {
            None => StateTransition::None,
            Some(EndReason::Aborted) => StateTransition::Back,
            Some(_) => StateTransition::Next,
        }
    }

    /// Dispatch every timer due at or before `limit_us` (session time).
    fn run_timers(&mut self, limit_us: i64, now_us: i64) {
        while self.phase != SessionPhase::Ended {
            let Some(timer) = self.timers.pop_until(limit_us) else {
                break;
            };
            self.dispatch(timer, now_us);
        }
    }

    fn dispatch(&mut self, timer: DueTimer, now_us: i64) {
        let DueTimer { due_us, kind } = timer;
        trace!("timer {:?} due {}", kind, due_us);
        match kind {
            TimerKind::Countdown(remaining) => {
                self.events.push(SessionEvent::CountdownTick { remaining });
            }
            TimerKind::BeginPlay => self.begin_play(due_us, now_us),
            TimerKind::Spawn(index) => self.spawn_note(index, due_us),
            TimerKind::Expire(id) => {
                if let Some(note) = self.spawner.expire(id) {
                    self.events.push(SessionEvent::NoteResolved {
                        id: note.id,
                        lane: note.lane,
                        judgement: Judgement::Miss,
                    });
                    self.apply(Judgement::Miss);
                    self.after_judgement(due_us, now_us);
                }
            }
            TimerKind::FinishDelay => {
                if self.phase == SessionPhase::Playing {
                    let success = self.ledger.satisfaction() > 0;
                    self.end(EndReason::Completed, success);
                }
            }
            TimerKind::SafetyTimeout => {
                if self.phase == SessionPhase::Playing {
                    warn!("Safety timeout reached for house {}", self.house);
                    self.end(EndReason::SafetyTimeout, true);
                }
            }
        }
    }

    fn begin_play(&mut self, due_us: i64, now_us: i64) {
        let SessionChart::Ready { beat_map, buffer } = &self.chart else {
            return;
        };
        self.phase = SessionPhase::Playing;
        self.play_start_us = Some(due_us);

        // A late frame starts the song part-way in to stay aligned with the timers.
        let offset = (self.clock.elapsed(now_us) - due_us).max(0);
        let duration_us = buffer.duration_us;
        if let Err(e) = self.player.play(buffer.clone(), offset, now_us) {
            error!("Failed to start carol audio: {e:#}");
        }

        for (index, note) in beat_map.notes().iter().enumerate() {
            let spawn_at = due_us.saturating_add(self.spawner.spawn_offset_us(note.time_us));
            self.timers.schedule(spawn_at, TimerKind::Spawn(index));
        }
        let last_note_us = beat_map.last_note_time_us().unwrap_or(0);
        self.timers.schedule(
            due_us
                .saturating_add(last_note_us)
                .saturating_add(self.settings.safety_margin_us),
            TimerKind::SafetyTimeout,
        );

        info!(
            "Caroling '{}' at house {} ({} notes)",
            self.song.name,
            self.house,
            beat_map.len()
        );
        self.events.push(SessionEvent::PlaybackStarted {
            song: self.song.name.clone(),
            duration_us,
        });
    }

    fn spawn_note(&mut self, index: usize, due_us: i64) {
        let SessionChart::Ready { beat_map, .. } = &self.chart else {
            return;
        };
        let Some(event) = beat_map.notes().get(index).copied() else {
            return;
        };
        let note = self.spawner.spawn(event.lane, event.duration_us, due_us);
        self.timers.schedule(note.arrival_us, TimerKind::Expire(note.id));
        self.events.push(SessionEvent::NoteSpawned {
            id: note.id,
            lane: note.lane,
            arrival_us: note.arrival_us,
            duration_us: note.duration_us,
        });
    }

    fn apply(&mut self, judgement: Judgement) {
        self.ledger.apply(judgement);
        let value = self.ledger.satisfaction();
        self.events.push(SessionEvent::ScoreChanged {
            score: self.ledger.score(),
            combo: self.ledger.combo(),
        });
        self.events.push(SessionEvent::SatisfactionChanged {
            value,
            mood: Mood::from_satisfaction(value),
        });
    }

    fn after_judgement(&mut self, at_us: i64, now_us: i64) {
        if self.ledger.is_failed() {
            self.end(EndReason::SatisfactionDepleted, false);
        } else {
            self.check_completion(at_us, now_us);
        }
    }

    fn check_completion(&mut self, at_us: i64, now_us: i64) {
        if self.phase != SessionPhase::Playing || self.finish_scheduled {
            return;
        }
        let Some(duration_us) = self.player.duration_us().or(match &self.chart {
            SessionChart::Ready { buffer, .. } => Some(buffer.duration_us),
            SessionChart::Malformed { .. } => None,
        }) else {
            return;
        };
        let complete = self.ledger.is_complete(
            self.song_ended,
            self.spawner.active_count(),
            self.song_position_us(now_us),
            duration_us,
            self.settings.completion_grace_us,
        );
        if complete {
            debug!("Completion check passed, finishing in {}us", self.settings.finish_delay_us);
            self.finish_scheduled = true;
            self.timers
                .schedule(at_us + self.settings.finish_delay_us, TimerKind::FinishDelay);
        }
    }

    /// Enter the terminal phase. Only the first call has any effect.
    fn end(&mut self, reason: EndReason, success: bool) {
        if self.phase == SessionPhase::Ended {
            return;
        }
        self.phase = SessionPhase::Ended;
        self.paused = false;
        self.timers.clear();
        let cleared = self.spawner.clear();
        if let Err(e) = self.player.stop() {
            warn!("Failed to stop carol audio: {e:#}");
        }

        let result =
            SessionResult::from_ledger(self.house, &self.song.name, success, reason, &self.ledger);
        info!(
            "Session at house {} ended: {:?}, success={}, satisfaction={}, score={}, accuracy={}% ({} notes cleared)",
            self.house,
            reason,
            success,
            result.final_satisfaction,
            result.score,
            result.accuracy_percent,
            cleared
        );
        self.events.push(SessionEvent::SessionEnded {
            result: result.clone(),
        });
        self.result = Some(result);
    }
}

impl<A: AudioOutput> Scene for CarolingSession<A> {
    fn on_enter(&mut self, now_us: i64) -> Result<()> {
        if self.phase != SessionPhase::Idle {
            return Ok(());
        }
        self.clock.start(0, now_us);

        if let SessionChart::Malformed { reason } = &self.chart {
            warn!("Beat map for '{}' is malformed: {}", self.song.name, reason);
            self.end(EndReason::MalformedBeatMap, false);
            return Ok(());
        }

        self.phase = SessionPhase::Countdown;
        let tick = self.settings.countdown_tick_us;
        let steps = self.settings.countdown_steps;
        for i in 0..=steps {
            self.timers
                .schedule(i as i64 * tick, TimerKind::Countdown(steps - i));
        }
        self.timers
            .schedule(self.settings.play_start_offset_us(), TimerKind::BeginPlay);

        self.run_timers(0, now_us);
        Ok(())
    }

    fn on_tick(&mut self, now_us: i64) -> Result<StateTransition> {
        if self.phase == SessionPhase::Ended || self.paused || self.phase == SessionPhase::Idle {
            return Ok(self.transition());
        }

        if self.player.poll_ended() {
            debug!("Carol audio finished");
            self.song_ended = true;
        }

        let session_now = self.clock.elapsed(now_us);
        self.run_timers(session_now, now_us);
        self.check_completion(session_now, now_us);
        Ok(self.transition())
    }

    fn on_input(&mut self, event: KeyEvent) -> Result<StateTransition> {
        if self.phase != SessionPhase::Playing || self.paused {
            trace!("Ignoring press in lane {} outside play", event.lane);
            return Ok(self.transition());
        }
        if event.lane >= LANE_COUNT {
            trace!("Ignoring press in unknown lane {}", event.lane);
            return Ok(self.transition());
        }

        // Catch up on everything strictly before the press, so a note
        // arriving at this exact instant can still be hit.
        let at_us = self.clock.elapsed(event.time_us);
        self.run_timers(at_us - 1, event.time_us);
        if self.phase != SessionPhase::Playing {
            return Ok(self.transition());
        }

        match self.spawner.judge_press(event.lane, at_us) {
            Some((note, tier)) => {
                trace!("Hit {:?} on note {:?}", tier, note.id);
                self.events.push(SessionEvent::NoteResolved {
                    id: note.id,
                    lane: note.lane,
                    judgement: Judgement::Hit(tier),
                });
                self.apply(Judgement::Hit(tier));
            }
            None => {
                self.events.push(SessionEvent::StrayPress { lane: event.lane });
                self.apply(Judgement::Stray);
            }
        }
        self.after_judgement(at_us, event.time_us);
        Ok(self.transition())
    }

    fn on_exit(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::beat_map::NoteEvent;
    use crate::play::judge::HitTier;
    use crate::test_utils::builders::{BeatMapBuilder, mock_session};
    use crate::traits::audio::{AudioCall, MockAudio};
    use std::path::Path;

    const SONG_US: i64 = 20_000_000;
    // Session time when the song starts: 3, 2, 1, GO then play.
    const PLAY_AT: i64 = 4_000_000;

    fn session(notes: Vec<NoteEvent>, satisfaction: i32) -> CarolingSession<MockAudio> {
        mock_session(BeatMap::new(notes), SONG_US, satisfaction)
    }

    fn press(lane: usize, time_us: i64) -> KeyEvent {
        KeyEvent { lane, time_us }
    }

    #[test]
    fn countdown_then_play() {
        let mut s = session(vec![NoteEvent::new(0, 3_000_000)], 50);
        s.on_enter(0).unwrap();
        assert_eq!(s.phase(), SessionPhase::Countdown);
        assert_eq!(s.drain_events(), vec![SessionEvent::CountdownTick { remaining: 3 }]);

        s.on_tick(3_000_000).unwrap();
        assert_eq!(
            s.drain_events(),
            vec![
                SessionEvent::CountdownTick { remaining: 2 },
                SessionEvent::CountdownTick { remaining: 1 },
                SessionEvent::CountdownTick { remaining: 0 },
            ]
        );

        s.on_tick(PLAY_AT).unwrap();
        assert_eq!(s.phase(), SessionPhase::Playing);
        let events = s.drain_events();
        assert!(matches!(events[0], SessionEvent::PlaybackStarted { duration_us: SONG_US, .. }));
        assert!(
            s.player()
                .output()
                .calls()
                .iter()
                .any(|c| matches!(c, AudioCall::Play { offset_us: 0, .. }))
        );
    }

    #[test]
    fn press_before_play_is_ignored() {
        let mut s = session(vec![NoteEvent::new(0, 3_000_000)], 50);
        s.on_enter(0).unwrap();
        s.on_input(press(0, 500_000)).unwrap();
        assert_eq!(s.ledger().stray_count(), 0);
        assert_eq!(s.ledger().satisfaction(), 50);
    }

    #[test]
    fn note_spawns_lead_before_target() {
        let mut s = session(vec![NoteEvent::new(2, 5_000_000)], 50);
        s.on_enter(0).unwrap();
        s.on_tick(PLAY_AT + 2_999_999).unwrap();
        assert!(s.active_notes().is_empty());
        s.on_tick(PLAY_AT + 3_000_000).unwrap();
        assert_eq!(s.active_notes().len(), 1);
        assert_eq!(s.active_notes()[0].arrival_us, PLAY_AT + 5_000_000);
    }

    #[test]
    fn early_note_spawns_at_play_start() {
        let mut s = session(vec![NoteEvent::new(1, 500_000)], 50);
        s.on_enter(0).unwrap();
        s.on_tick(PLAY_AT).unwrap();
        assert_eq!(s.active_notes().len(), 1);
        assert_eq!(s.active_notes()[0].arrival_us, PLAY_AT + 2_000_000);
    }

    #[test]
    fn press_at_arrival_is_perfect() {
        let mut s = session(vec![NoteEvent::new(0, 3_000_000)], 50);
        s.on_enter(0).unwrap();
        s.on_tick(PLAY_AT + 1_000_000).unwrap();
        s.on_input(press(0, PLAY_AT + 3_000_000)).unwrap();
        assert_eq!(s.ledger().tier_count(HitTier::Perfect), 1);
        assert_eq!(s.ledger().score(), 100);
        assert_eq!(s.ledger().satisfaction(), 60);
        assert!(s.active_notes().is_empty());
    }

    #[test]
    fn unplayed_note_expires_as_miss() {
        let mut s = session(vec![NoteEvent::new(0, 3_000_000), NoteEvent::new(1, 9_000_000)], 50);
        s.on_enter(0).unwrap();
        s.on_tick(PLAY_AT + 3_000_000).unwrap();
        assert_eq!(s.ledger().miss_count(), 1);
        assert_eq!(s.ledger().satisfaction(), 40);
        assert!(s.drain_events().iter().any(|e| matches!(
            e,
            SessionEvent::NoteResolved {
                judgement: Judgement::Miss,
                ..
            }
        )));
    }

    #[test]
    fn late_press_after_expiry_is_stray() {
        let mut s = session(vec![NoteEvent::new(0, 3_000_000), NoteEvent::new(1, 9_000_000)], 50);
        s.on_enter(0).unwrap();
        s.on_tick(PLAY_AT + 1_000_000).unwrap();
        s.on_input(press(0, PLAY_AT + 3_050_000)).unwrap();
        assert_eq!(s.ledger().miss_count(), 1);
        assert_eq!(s.ledger().stray_count(), 1);
        assert_eq!(s.ledger().satisfaction(), 30);
    }

    #[test]
    fn depletion_ends_immediately() {
        let map = BeatMapBuilder::new().stream(0, 3_000_000, 500_000, 3).build();
        let mut s = mock_session(map, SONG_US, 20);
        s.on_enter(0).unwrap();
        let transition = s.on_tick(PLAY_AT + 10_000_000).unwrap();
        assert_eq!(transition, StateTransition::Next);
        let result = s.result().unwrap();
        assert!(!result.success);
        assert_eq!(result.reason, EndReason::SatisfactionDepleted);
        assert_eq!(result.miss_count, 2);
        assert!(s.active_notes().is_empty());
    }

    #[test]
    fn completion_after_song_end_waits_finish_delay() {
        let mut s = session(vec![NoteEvent::new(0, 3_000_000)], 50);
        s.on_enter(0).unwrap();
        s.on_tick(PLAY_AT + 1_000_000).unwrap();
        s.on_input(press(0, PLAY_AT + 3_000_000)).unwrap();

        let voice = s.player().output().last_voice().unwrap();
        s.player_mut().output_mut().finish(voice);
        s.on_tick(PLAY_AT + 4_000_000).unwrap();
        assert_eq!(s.phase(), SessionPhase::Playing);

        assert_eq!(s.on_tick(PLAY_AT + 4_500_000).unwrap(), StateTransition::Next);
        let result = s.result().unwrap();
        assert!(result.success);
        assert_eq!(result.reason, EndReason::Completed);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn completion_near_song_end_without_notification() {
        // Safety timeout would fire at 21s, after the song's 20s.
        let mut s = session(vec![NoteEvent::new(0, 16_000_000)], 50);
        s.on_enter(0).unwrap();
        s.on_tick(PLAY_AT + 15_000_000).unwrap();
        s.on_input(press(0, PLAY_AT + 16_000_000)).unwrap();
        assert_eq!(s.ledger().hit_count(), 1);

        s.on_tick(PLAY_AT + SONG_US - 1_000_000).unwrap();
        assert_eq!(s.phase(), SessionPhase::Playing);
        s.on_tick(PLAY_AT + SONG_US - 999_000).unwrap();
        s.on_tick(PLAY_AT + SONG_US).unwrap();
        assert_eq!(s.result().map(|r| r.reason), Some(EndReason::Completed));
    }

    #[test]
    fn safety_timeout_ends_in_success() {
        // The song is far longer than the notes, and the voice never ends.
        let mut player = CarolPlayer::new(MockAudio::new().with_buffer("long.mp3", 600_000_000));
        let buffer = player.load(Path::new("long.mp3")).unwrap();
        let mut s = CarolingSession::new(
            SessionSetup {
                house: 1,
                song: SongRef::new("Long Carol", "long.mp3", "long.json"),
                initial_satisfaction: 50,
                settings: SessionSettings::default(),
            },
            SessionChart::Ready {
                beat_map: BeatMap::new(vec![NoteEvent::new(0, 3_000_000)]),
                buffer,
            },
            player,
        );
        s.on_enter(0).unwrap();
        s.on_tick(PLAY_AT + 1_000_000).unwrap();
        s.on_input(press(0, PLAY_AT + 3_000_000)).unwrap();
        s.on_tick(PLAY_AT + 7_999_999).unwrap();
        assert_eq!(s.phase(), SessionPhase::Playing);
        s.on_tick(PLAY_AT + 8_000_000).unwrap();
        let result = s.result().unwrap();
        assert!(result.success);
        assert_eq!(result.reason, EndReason::SafetyTimeout);
    }

    #[test]
    fn pause_freezes_notes_and_audio() {
        let mut s = session(vec![NoteEvent::new(0, 3_000_000), NoteEvent::new(1, 9_000_000)], 50);
        s.on_enter(0).unwrap();
        s.on_tick(PLAY_AT + 2_000_000).unwrap();
        s.pause(PLAY_AT + 2_000_000).unwrap();
        assert!(s.is_paused());

        // Nothing expires while paused.
        s.on_tick(PLAY_AT + 60_000_000).unwrap();
        assert_eq!(s.ledger().miss_count(), 0);
        s.on_input(press(0, PLAY_AT + 60_000_000)).unwrap();
        assert_eq!(s.ledger().stray_count(), 0);

        s.resume(PLAY_AT + 60_000_000).unwrap();
        assert!(matches!(
            s.player().output().calls().last(),
            Some(AudioCall::Play {
                offset_us: 2_000_000,
                ..
            })
        ));
        // The note is still one second from the hit line.
        s.on_input(press(0, PLAY_AT + 61_000_000)).unwrap();
        assert_eq!(s.ledger().tier_count(HitTier::Perfect), 1);
        let events = s.drain_events();
        assert!(events.contains(&SessionEvent::Paused));
        assert!(events.contains(&SessionEvent::Resumed));
    }

    #[test]
    fn end_is_idempotent() {
        let mut s = session(vec![NoteEvent::new(0, 3_000_000)], 50);
        s.on_enter(0).unwrap();
        s.on_tick(PLAY_AT).unwrap();
        s.abort();
        s.abort();
        s.on_exit();
        let ended = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::SessionEnded { .. }))
            .count();
        assert_eq!(ended, 1);
        assert_eq!(s.result().map(|r| r.reason), Some(EndReason::Aborted));
        assert_eq!(s.on_tick(PLAY_AT + 1).unwrap(), StateTransition::Back);
        assert!(!s.player().is_playing());
    }

    #[test]
    fn malformed_chart_fails_on_entry() {
        let player = CarolPlayer::new(MockAudio::new());
        let mut s = CarolingSession::new(
            SessionSetup {
                house: 4,
                song: SongRef::new("Broken", "broken.mp3", "broken.json"),
                initial_satisfaction: 45,
                settings: SessionSettings::default(),
            },
            SessionChart::Malformed {
                reason: "missing notes list".to_string(),
            },
            player,
        );
        s.on_enter(0).unwrap();
        let result = s.result().unwrap();
        assert!(!result.success);
        assert_eq!(result.reason, EndReason::MalformedBeatMap);
        assert_eq!(result.final_satisfaction, 45);
        assert_eq!(s.player().output().play_count(), 0);
    }

    #[test]
    fn unknown_lane_is_ignored() {
        let mut s = session(vec![NoteEvent::new(0, 3_000_000)], 50);
        s.on_enter(0).unwrap();
        s.on_tick(PLAY_AT).unwrap();
        s.on_input(press(7, PLAY_AT + 100)).unwrap();
        assert_eq!(s.ledger().stray_count(), 0);
    }

    #[test]
    fn far_future_note_does_not_overflow_schedule() {
        let mut s = session(vec![NoteEvent::new(0, i64::MAX)], 50);
        s.on_enter(0).unwrap();
        s.on_tick(PLAY_AT).unwrap();
        assert_eq!(s.phase(), SessionPhase::Playing);

        s.on_tick(PLAY_AT + 60_000_000).unwrap();
        assert!(s.active_notes().is_empty());
        assert!(!s.is_ended());
        s.abort();
        assert_eq!(s.result().map(|r| r.reason), Some(EndReason::Aborted));
    }

    #[test]
    fn audio_stop_failure_still_pauses_and_resumes() {
        let mut player =
            CarolPlayer::new(MockAudio::new().with_buffer("carol.mp3", SONG_US).failing_stop());
        let buffer = player.load(Path::new("carol.mp3")).unwrap();
        let mut s = CarolingSession::new(
            SessionSetup {
                house: 1,
                song: SongRef::new("Test Carol", "carol.mp3", "carol.json"),
                initial_satisfaction: 50,
                settings: SessionSettings::default(),
            },
            SessionChart::Ready {
                beat_map: BeatMap::new(vec![NoteEvent::new(0, 3_000_000)]),
                buffer,
            },
            player,
        );
        s.on_enter(0).unwrap();
        s.on_tick(5_000_000).unwrap();

        s.pause(5_000_000).unwrap();
        assert!(s.is_paused());
        s.resume(6_000_000).unwrap();
        assert!(!s.is_paused());

        // One second lost to the pause; the note arrives at session time 7s.
        s.on_tick(8_000_001).unwrap();
        assert_eq!(s.session_time_us(8_000_001), 7_000_001);
        assert_eq!(s.ledger().miss_count(), 1);
        assert!(s.active_notes().is_empty());
    }
}
