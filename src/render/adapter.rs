use anyhow::Result;

use crate::play::judge::Judgement;
use crate::play::mood::Mood;
use crate::state::caroling::SessionEvent;
use crate::traits::render::{HudState, ScenePresenter};

/// Translates session events into presenter calls.
///
/// Keeps the HUD values between events and only reports a mood change
/// when the mood actually changes.
pub struct PresentationAdapter<P: ScenePresenter> {
    presenter: P,
    hud: HudState,
    mood: Option<Mood>,
}

impl<P: ScenePresenter> PresentationAdapter<P> {
    pub fn new(presenter: P) -> Self {
        Self {
            presenter,
            hud: HudState::default(),
            mood: None,
        }
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }

    pub fn hud(&self) -> HudState {
        self.hud
    }

    pub fn handle_all(&mut self, events: &[SessionEvent]) -> Result<()> {
        for event in events {
            self.handle(event)?;
        }
        Ok(())
    }

    pub fn handle(&mut self, event: &SessionEvent) -> Result<()> {
        match event {
            SessionEvent::CountdownTick { remaining } => self.presenter.show_countdown(*remaining),
            SessionEvent::PlaybackStarted { song, duration_us } => {
                self.presenter.start_song(song, *duration_us)
            }
            SessionEvent::NoteSpawned {
                id,
                lane,
                arrival_us,
                ..
            } => self.presenter.spawn_note(*id, *lane, *arrival_us),
            SessionEvent::NoteResolved {
                id,
                lane,
                judgement,
            } => {
                self.presenter.remove_note(*id)?;
                self.presenter.show_judgement(*lane, *judgement)
            }
            SessionEvent::StrayPress { lane } => {
                self.presenter.show_judgement(*lane, Judgement::Stray)
            }
            SessionEvent::ScoreChanged { score, combo } => {
                self.hud.score = *score;
                self.hud.combo = *combo;
                self.presenter.update_hud(self.hud)
            }
            SessionEvent::SatisfactionChanged { value, mood } => {
                self.hud.satisfaction = *value;
                self.presenter.update_hud(self.hud)?;
                if self.mood != Some(*mood) {
                    self.mood = Some(*mood);
                    self.presenter.set_mood(*mood)?;
                }
                Ok(())
            }
            SessionEvent::Paused => self.presenter.set_paused(true),
            SessionEvent::Resumed => self.presenter.set_paused(false),
            SessionEvent::SessionEnded { result } => self.presenter.show_result(result),
        }
    }
}
