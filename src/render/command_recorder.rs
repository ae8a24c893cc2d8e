use std::collections::HashSet;

use anyhow::{Result, anyhow};

use crate::play::judge::Judgement;
use crate::play::mood::Mood;
use crate::play::note_spawner::NoteId;
use crate::state::caroling::SessionResult;
use crate::traits::render::{HudState, ScenePresenter};

/// Recorded presenter call for testing.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentCommand {
    Countdown(u32),
    StartSong { title: String, duration_us: i64 },
    SpawnNote { id: NoteId, lane: usize, arrival_us: i64 },
    RemoveNote(NoteId),
    Judgement { lane: usize, judgement: Judgement },
    Hud(HudState),
    Mood(Mood),
    Paused(bool),
    Result(Box<SessionResult>),
}

/// A ScenePresenter that records calls for snapshot testing.
/// Rejects removal of notes it never saw spawn.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<PresentCommand>,
    notes_on_track: HashSet<NoteId>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded commands.
    pub fn commands(&self) -> &[PresentCommand] {
        &self.commands
    }

    /// Clear recorded commands.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Notes spawned and not yet removed.
    pub fn notes_on_track(&self) -> usize {
        self.notes_on_track.len()
    }
}

impl ScenePresenter for CommandRecorder {
    fn show_countdown(&mut self, remaining: u32) -> Result<()> {
        self.commands.push(PresentCommand::Countdown(remaining));
        Ok(())
    }

    fn start_song(&mut self, title: &str, duration_us: i64) -> Result<()> {
        self.commands.push(PresentCommand::StartSong {
            title: title.to_string(),
            duration_us,
        });
        Ok(())
    }

    fn spawn_note(&mut self, id: NoteId, lane: usize, arrival_us: i64) -> Result<()> {
        self.notes_on_track.insert(id);
        self.commands.push(PresentCommand::SpawnNote {
            id,
            lane,
            arrival_us,
        });
        Ok(())
    }

    fn remove_note(&mut self, id: NoteId) -> Result<()> {
        if !self.notes_on_track.remove(&id) {
            return Err(anyhow!("unknown note: {:?}", id));
        }
        self.commands.push(PresentCommand::RemoveNote(id));
        Ok(())
    }

    fn show_judgement(&mut self, lane: usize, judgement: Judgement) -> Result<()> {
        self.commands.push(PresentCommand::Judgement { lane, judgement });
        Ok(())
    }

    fn update_hud(&mut self, hud: HudState) -> Result<()> {
        self.commands.push(PresentCommand::Hud(hud));
        Ok(())
    }

    fn set_mood(&mut self, mood: Mood) -> Result<()> {
        self.commands.push(PresentCommand::Mood(mood));
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) -> Result<()> {
        self.commands.push(PresentCommand::Paused(paused));
        Ok(())
    }

    fn show_result(&mut self, result: &SessionResult) -> Result<()> {
        // The session's notes are gone once the result is up.
        self.notes_on_track.clear();
        self.commands
            .push(PresentCommand::Result(Box::new(result.clone())));
        Ok(())
    }
}
