use serde::{Deserialize, Serialize};

/// Hit quality of a key press that matched a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitTier {
    Perfect,
    Good,
    Bad,
}

impl HitTier {
    pub const ALL: [Self; 3] = [Self::Perfect, Self::Good, Self::Bad];

    /// Score awarded for the tier. Never negative.
    pub fn score(self) -> u32 {
        match self {
            Self::Perfect => 100,
            Self::Good => 50,
            Self::Bad => 0,
        }
    }

    /// Satisfaction change for the tier.
    pub fn satisfaction_delta(self) -> i32 {
        match self {
            Self::Perfect => 10,
            Self::Good => 7,
            Self::Bad => MISS_SATISFACTION_DELTA,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Perfect => "PERFECT",
            Self::Good => "GOOD",
            Self::Bad => "BAD",
        }
    }
}

/// Satisfaction change for a missed note or a stray press.
pub const MISS_SATISFACTION_DELTA: i32 = -10;

/// Final resolution of a note or a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Judgement {
    /// A press matched a note.
    Hit(HitTier),
    /// A note reached the hit line unplayed.
    Miss,
    /// A press matched no note.
    Stray,
}

impl Judgement {
    pub fn score(self) -> u32 {
        match self {
            Self::Hit(tier) => tier.score(),
            Self::Miss | Self::Stray => 0,
        }
    }

    pub fn satisfaction_delta(self) -> i32 {
        match self {
            Self::Hit(tier) => tier.satisfaction_delta(),
            Self::Miss | Self::Stray => MISS_SATISFACTION_DELTA,
        }
    }

    /// Every hit extends the combo, Bad included.
    pub fn keeps_combo(self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Timing windows around a note's arrival, derived from the on-screen track.
///
/// Notes travel `track_length` units in `lead_us`. A press `d` units from the
/// hit line is Perfect when `d < perfect`, Good when `d < good` and Bad when
/// `d < hit`. All comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JudgeWindow {
    perfect_us: i64,
    good_us: i64,
    hit_us: i64,
}

impl JudgeWindow {
    pub fn from_track(lead_us: i64, track_length: f64, perfect: f64, good: f64, hit: f64) -> Self {
        let to_us = |distance: f64| (distance / track_length * lead_us as f64).round() as i64;
        Self {
            perfect_us: to_us(perfect),
            good_us: to_us(good),
            hit_us: to_us(hit),
        }
    }

    pub fn from_us(perfect_us: i64, good_us: i64, hit_us: i64) -> Self {
        Self {
            perfect_us,
            good_us,
            hit_us,
        }
    }

    pub fn perfect_us(&self) -> i64 {
        self.perfect_us
    }

    pub fn good_us(&self) -> i64 {
        self.good_us
    }

    /// Outermost window; presses at or beyond this distance hit nothing.
    pub fn hit_us(&self) -> i64 {
        self.hit_us
    }

    /// Classify a press `offset_us` away from the arrival instant (either sign).
    pub fn classify(&self, offset_us: i64) -> Option<HitTier> {
        let d = offset_us.abs();
        if d < self.perfect_us {
            Some(HitTier::Perfect)
        } else if d < self.good_us {
            Some(HitTier::Good)
        } else if d < self.hit_us {
            Some(HitTier::Bad)
        } else {
            None
        }
    }
}

impl Default for JudgeWindow {
    /// 600-unit track, 2 s lead, tiers at 30 / 60 / 120 units.
    fn default() -> Self {
        Self::from_track(2_000_000, 600.0, 30.0, 60.0, 120.0)
    }
}
