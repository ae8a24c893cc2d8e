//! End-to-end session scenarios driven with a mock clock and mock audio.

use std::path::Path;

use caroling::audio::CarolPlayer;
use caroling::model::{BeatMap, NoteEvent, SongRef};
use caroling::play::HitTier;
use caroling::state::caroling::{
    CarolingSession, EndReason, SessionChart, SessionEvent, SessionPhase, SessionSettings,
    SessionSetup,
};
use caroling::state::game_state::{Scene, StateTransition};
use caroling::traits::audio::MockAudio;
use caroling::traits::input::KeyEvent;
use proptest::prelude::*;

const SONG_US: i64 = 20_000_000;
const PLAY_AT: i64 = 4_000_000;
const LEAD_US: i64 = 2_000_000;

fn session(notes: Vec<NoteEvent>, satisfaction: i32) -> CarolingSession<MockAudio> {
    let mut player = CarolPlayer::new(MockAudio::new().with_buffer("carol.mp3", SONG_US));
    let buffer = player.load(Path::new("carol.mp3")).unwrap();
    CarolingSession::new(
        SessionSetup {
            house: 1,
            song: SongRef::new("Silent Night", "carol.mp3", "carol.json"),
            initial_satisfaction: satisfaction,
            settings: SessionSettings::default(),
        },
        SessionChart::Ready {
            beat_map: BeatMap::new(notes),
            buffer,
        },
        player,
    )
}

/// Wall time a note targeted at `time_us` reaches the hit line.
fn arrival(time_us: i64) -> i64 {
    PLAY_AT + time_us.max(LEAD_US)
}

fn press(lane: usize, time_us: i64) -> KeyEvent {
    KeyEvent { lane, time_us }
}

fn finish_song(s: &mut CarolingSession<MockAudio>) {
    let voice = s.player().output().last_voice().unwrap();
    s.player_mut().output_mut().finish(voice);
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_all_perfect_run_wins() {
    let notes: Vec<NoteEvent> = (0..10)
        .map(|i| NoteEvent::new(i % 4, 3_000_000 + i as i64 * 500_000))
        .collect();
    let mut s = session(notes.clone(), 55);
    s.on_enter(0).unwrap();
    s.on_tick(PLAY_AT).unwrap();

    for note in &notes {
        let at = arrival(note.time_us);
        s.on_tick(at - 16_000).unwrap();
        s.on_input(press(note.lane, at)).unwrap();
    }
    assert_eq!(s.ledger().tier_count(HitTier::Perfect), 10);

    let after_last = arrival(notes[9].time_us) + 100_000;
    s.on_tick(after_last).unwrap();
    finish_song(&mut s);
    s.on_tick(after_last + 16_000).unwrap();
    assert!(!s.is_ended(), "finish waits for the settle delay");

    let transition = s.on_tick(after_last + 600_000).unwrap();
    assert_eq!(transition, StateTransition::Next);

    let result = s.result().unwrap();
    assert!(result.success);
    assert_eq!(result.reason, EndReason::Completed);
    assert_eq!(result.score, 1000);
    assert_eq!(result.final_satisfaction, 100);
    assert_eq!(result.max_combo, 10);
    assert_eq!(result.accuracy_percent, 100);
}

#[test]
fn test_misses_deplete_satisfaction_mid_song() {
    let notes: Vec<NoteEvent> = (0..6)
        .map(|i| NoteEvent::new(0, 3_000_000 + i as i64 * 1_000_000))
        .collect();
    let mut s = session(notes, 50);
    s.on_enter(0).unwrap();

    s.on_tick(PLAY_AT + 15_000_000).unwrap();

    let result = s.result().unwrap();
    assert!(!result.success);
    assert_eq!(result.reason, EndReason::SatisfactionDepleted);
    assert_eq!(result.miss_count, 5);
    assert_eq!(result.hit_count, 0);
    assert_eq!(result.final_satisfaction, 0);
    assert!(s.active_notes().is_empty());
}

#[test]
fn test_stray_press_costs_satisfaction_and_combo() {
    let mut s = session(
        vec![NoteEvent::new(0, 3_000_000), NoteEvent::new(0, 6_000_000)],
        60,
    );
    s.on_enter(0).unwrap();
    s.on_tick(arrival(3_000_000) - 16_000).unwrap();
    s.on_input(press(0, arrival(3_000_000))).unwrap();
    s.drain_events();

    s.on_input(press(3, arrival(3_000_000) + 200_000)).unwrap();

    let ledger = s.ledger();
    assert_eq!(ledger.stray_count(), 1);
    assert_eq!(ledger.miss_count(), 0);
    assert_eq!(ledger.combo(), 0);
    assert_eq!(ledger.satisfaction(), 60);
    let events = s.drain_events();
    assert!(events.contains(&SessionEvent::StrayPress { lane: 3 }));
}

#[test]
fn test_press_picks_closest_note_in_lane() {
    let mut s = session(
        vec![NoteEvent::new(1, 3_000_000), NoteEvent::new(1, 3_300_000)],
        50,
    );
    s.on_enter(0).unwrap();
    s.on_tick(arrival(3_000_000) - 100_000).unwrap();

    // 50ms before the first note and 350ms before the second.
    s.on_input(press(1, arrival(3_000_000) - 50_000)).unwrap();

    assert_eq!(s.ledger().tier_count(HitTier::Perfect), 1);
    assert_eq!(s.active_notes().len(), 1);
    assert_eq!(s.active_notes()[0].arrival_us, arrival(3_300_000));
}

#[test]
fn test_abort_counts_as_failure() {
    let mut s = session(vec![NoteEvent::new(0, 3_000_000)], 80);
    s.on_enter(0).unwrap();
    s.on_tick(PLAY_AT + 100_000).unwrap();

    s.on_exit();

    let result = s.result().unwrap();
    assert!(!result.success);
    assert_eq!(result.reason, EndReason::Aborted);
    assert_eq!(s.on_tick(PLAY_AT + 200_000).unwrap(), StateTransition::Back);
    assert_eq!(s.phase(), SessionPhase::Ended);
}

#[test]
fn test_single_session_ended_event() {
    let mut s = session(vec![NoteEvent::new(0, 3_000_000)], 10);
    s.on_enter(0).unwrap();
    s.on_tick(PLAY_AT + 10_000_000).unwrap();
    s.on_exit();
    s.on_tick(PLAY_AT + 20_000_000).unwrap();

    let ended = s
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::SessionEnded { .. }))
        .count();
    assert_eq!(ended, 1);
}

// =========================================================================
// Invariants
// =========================================================================

proptest! {
    #[test]
    fn prop_ledger_invariants_hold(
        initial in 0i32..=100,
        note_times in prop::collection::vec(0i64..10_000_000, 1..20),
        presses in prop::collection::vec((0usize..4, 0i64..18_000_000), 0..40),
    ) {
        let notes: Vec<NoteEvent> = note_times
            .iter()
            .enumerate()
            .map(|(i, t)| NoteEvent::new(i % 4, *t))
            .collect();
        let total = notes.len() as u32;
        let mut s = session(notes, initial);
        s.on_enter(0).unwrap();

        let mut presses = presses;
        presses.sort_by_key(|(_, t)| *t);
        for (lane, t) in presses {
            s.on_tick(t).unwrap();
            s.on_input(press(lane, t)).unwrap();
            let ledger = s.ledger();
            prop_assert!((0..=100).contains(&ledger.satisfaction()));
            prop_assert!(ledger.hit_count() + ledger.miss_count() <= total);
        }
        s.on_tick(30_000_000).unwrap();

        prop_assert!(s.is_ended());
        let result = s.result().unwrap();
        prop_assert!(result.hit_count + result.miss_count <= result.total_notes);
        prop_assert!((0..=100).contains(&result.final_satisfaction));
    }
}
