use std::io::Write;

use anyhow::Result;

use crate::model::beat_map::LANE_COUNT;
use crate::play::judge::{HitTier, Judgement};
use crate::play::mood::Mood;
use crate::play::note_spawner::NoteId;
use crate::state::caroling::{EndReason, SessionResult};
use crate::traits::render::{HudState, ScenePresenter};
use crate::traits::time::us_to_secs;
use crate::util::error::UserError;

/// Text presenter for headless runs.
///
/// Prints the countdown, mood changes, pauses and the final tally. With
/// `verbose` it also prints every judgement.
pub struct ConsolePresenter<W: Write> {
    out: W,
    verbose: bool,
    lane_hits: [u32; LANE_COUNT],
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            lane_hits: [0; LANE_COUNT],
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ScenePresenter for ConsolePresenter<W> {
    fn show_countdown(&mut self, remaining: u32) -> Result<()> {
        if remaining == 0 {
            writeln!(self.out, "GO!")?;
        } else {
            writeln!(self.out, "{remaining}...")?;
        }
        Ok(())
    }

    fn start_song(&mut self, title: &str, duration_us: i64) -> Result<()> {
        self.lane_hits = [0; LANE_COUNT];
        writeln!(self.out, "♪ {} ({:.1}s)", title, us_to_secs(duration_us))?;
        Ok(())
    }

    fn spawn_note(&mut self, _id: NoteId, _lane: usize, _arrival_us: i64) -> Result<()> {
        Ok(())
    }

    fn remove_note(&mut self, _id: NoteId) -> Result<()> {
        Ok(())
    }

    fn show_judgement(&mut self, lane: usize, judgement: Judgement) -> Result<()> {
        if let Judgement::Hit(_) = judgement
            && let Some(count) = self.lane_hits.get_mut(lane)
        {
            *count += 1;
        }
        if self.verbose {
            let label = match judgement {
                Judgement::Hit(tier) => tier.label(),
                Judgement::Miss => "MISS",
                Judgement::Stray => "STRAY",
            };
            writeln!(self.out, "  lane {lane}: {label}")?;
        }
        Ok(())
    }

    fn update_hud(&mut self, _hud: HudState) -> Result<()> {
        Ok(())
    }

    fn set_mood(&mut self, mood: Mood) -> Result<()> {
        writeln!(self.out, "  (the listener looks {})", mood.label())?;
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) -> Result<()> {
        writeln!(self.out, "{}", if paused { "-- paused --" } else { "-- resumed --" })?;
        Ok(())
    }

    fn show_result(&mut self, result: &SessionResult) -> Result<()> {
        writeln!(
            self.out,
            "{} at house {}: {:?}",
            if result.success { "SUCCESS" } else { "FAILED" },
            result.house,
            result.reason
        )?;
        if result.reason == EndReason::MalformedBeatMap {
            writeln!(self.out, "  {}", UserError::beat_map_malformed().replace('\n', " "))?;
            return Ok(());
        }
        writeln!(
            self.out,
            "  score {}  max combo {}  satisfaction {}%  accuracy {}%",
            result.score, result.max_combo, result.final_satisfaction, result.accuracy_percent
        )?;
        writeln!(
            self.out,
            "  {} {}  {} {}  {} {}  miss {}  stray {}",
            HitTier::Perfect.label(),
            result.perfect_count,
            HitTier::Good.label(),
            result.good_count,
            HitTier::Bad.label(),
            result.bad_count,
            result.miss_count,
            result.stray_count
        )?;
        writeln!(self.out, "  hits per lane {:?}", self.lane_hits)?;
        Ok(())
    }
}
