use crate::play::judge::Judgement;
use crate::play::mood::Mood;
use crate::play::note_spawner::NoteId;
use crate::state::caroling::session_result::SessionResult;

/// Notifications from a session to its presentation layer, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Countdown display; 0 means "GO".
    CountdownTick { remaining: u32 },
    PlaybackStarted { song: String, duration_us: i64 },
    NoteSpawned {
        id: NoteId,
        lane: usize,
        /// Session time the note reaches the hit line.
        arrival_us: i64,
        duration_us: i64,
    },
    /// A note was hit or missed. Only `Judgement::Hit` and `Judgement::Miss` appear here.
    NoteResolved {
        id: NoteId,
        lane: usize,
        judgement: Judgement,
    },
    StrayPress { lane: usize },
    SatisfactionChanged { value: i32, mood: Mood },
    ScoreChanged { score: u32, combo: u32 },
    Paused,
    Resumed,
    SessionEnded { result: SessionResult },
}
