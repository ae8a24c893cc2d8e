use std::collections::{BTreeSet, HashMap};

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::RunSettings;
use crate::model::song::{HouseNumber, SongCatalog, SongRef};
use crate::util::error::SessionError;

/// Effect of a finished session on the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Score banked. `newly_completed` is false for a house already in the set.
    Completed { newly_completed: bool },
    /// A life was lost and the player respawns in the village.
    LifeLost { remaining: u32 },
    /// The last life was lost.
    GameOver,
}

/// Read-only view of the run for result screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub lives: u32,
    pub max_lives: u32,
    pub total_score: u32,
    /// Completed house numbers in ascending order.
    pub completed_houses: Vec<HouseNumber>,
    pub can_exit: bool,
    pub game_over: bool,
}

/// Lives, banked score and completed houses across one run of the village.
pub struct RunProgress {
    catalog: SongCatalog,
    max_lives: u32,
    exit_score: u32,
    lives: u32,
    total_score: u32,
    completed: BTreeSet<HouseNumber>,
    /// Index of the last song picked per house.
    rotation: HashMap<HouseNumber, usize>,
    rng: StdRng,
}

impl RunProgress {
    pub fn new(catalog: SongCatalog, settings: &RunSettings, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            catalog,
            max_lives: settings.max_lives,
            exit_score: settings.exit_score,
            lives: settings.max_lives,
            total_score: 0,
            completed: BTreeSet::new(),
            rotation: HashMap::new(),
            rng,
        }
    }

    pub fn catalog(&self) -> &SongCatalog {
        &self.catalog
    }

    /// Pick the next song for `house`.
    ///
    /// The first pick is uniformly random; later picks rotate through the
    /// pool after the previous one.
    pub fn select_song(&mut self, house: HouseNumber) -> Result<SongRef, SessionError> {
        let songs = self
            .catalog
            .songs(house)
            .ok_or(SessionError::UnknownHouse(house))?;
        if songs.is_empty() {
            return Err(SessionError::EmptySongPool(house));
        }

        let index = match self.rotation.get(&house) {
            Some(last) => (last + 1) % songs.len(),
            None => self.rng.gen_range(0..songs.len()),
        };
        self.rotation.insert(house, index);
        debug!("House {} song {} of {}", house, index + 1, songs.len());
        Ok(songs[index].clone())
    }

    /// Starting satisfaction for a session at `house`: base plus 0..=10.
    pub fn initial_satisfaction(&mut self, house: HouseNumber) -> i32 {
        let base = self
            .catalog
            .house(house)
            .map(|h| h.satisfaction_base)
            .unwrap_or(50);
        base + self.rng.gen_range(0..=10)
    }

    pub fn record_result(&mut self, house: HouseNumber, success: bool, score: u32) -> RunOutcome {
        if success {
            self.total_score += score;
            let newly_completed = self.completed.insert(house);
            info!(
                "House {} completed (+{}), total score {}",
                house, score, self.total_score
            );
            return RunOutcome::Completed { newly_completed };
        }

        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            info!("House {} failed, game over", house);
            RunOutcome::GameOver
        } else {
            info!("House {} failed, {} lives left", house, self.lives);
            RunOutcome::LifeLost {
                remaining: self.lives,
            }
        }
    }

    pub fn can_exit(&self) -> bool {
        self.total_score >= self.exit_score
    }

    pub fn is_game_over(&self) -> bool {
        self.lives == 0
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    pub fn is_completed(&self, house: HouseNumber) -> bool {
        self.completed.contains(&house)
    }

    /// Reset lives, score, completed houses and song rotation.
    pub fn new_run(&mut self) {
        self.lives = self.max_lives;
        self.total_score = 0;
        self.completed.clear();
        self.rotation.clear();
        info!("New run started with {} lives", self.lives);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            lives: self.lives,
            max_lives: self.max_lives,
            total_score: self.total_score,
            completed_houses: self.completed.iter().copied().collect(),
            can_exit: self.can_exit(),
            game_over: self.is_game_over(),
        }
    }
}
