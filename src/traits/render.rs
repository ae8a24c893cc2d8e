use anyhow::Result;

use crate::play::judge::Judgement;
use crate::play::mood::Mood;
use crate::play::note_spawner::NoteId;
use crate::state::caroling::SessionResult;

/// Score line shown above the lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HudState {
    pub score: u32,
    pub combo: u32,
    pub satisfaction: i32,
}

/// Abstraction over whatever draws the caroling scene.
/// Implementations: ConsolePresenter (headless), CommandRecorder (testing).
pub trait ScenePresenter {
    /// Countdown overlay; 0 means "GO".
    fn show_countdown(&mut self, remaining: u32) -> Result<()>;

    fn start_song(&mut self, title: &str, duration_us: i64) -> Result<()>;

    /// Put a falling note on the track. `arrival_us` is session time.
    fn spawn_note(&mut self, id: NoteId, lane: usize, arrival_us: i64) -> Result<()>;

    fn remove_note(&mut self, id: NoteId) -> Result<()>;

    /// Hit effect, miss flash or stray shake for a lane.
    fn show_judgement(&mut self, lane: usize, judgement: Judgement) -> Result<()>;

    fn update_hud(&mut self, hud: HudState) -> Result<()>;

    fn set_mood(&mut self, mood: Mood) -> Result<()>;

    fn set_paused(&mut self, paused: bool) -> Result<()>;

    fn show_result(&mut self, result: &SessionResult) -> Result<()>;
}
