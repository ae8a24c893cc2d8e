use serde::{Deserialize, Serialize};

use crate::model::song::HouseNumber;
use crate::play::judge::HitTier;
use crate::play::ledger::SatisfactionLedger;
use crate::play::mood::Mood;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// Every note was processed and the song finished.
    Completed,
    /// Satisfaction dropped to zero.
    SatisfactionDepleted,
    /// The song ran well past its last note without completing.
    SafetyTimeout,
    /// The beat map had no usable note list.
    MalformedBeatMap,
    /// The player left mid-song.
    Aborted,
}

/// Outcome of one caroling session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub house: HouseNumber,
    pub song: String,
    pub success: bool,
    pub reason: EndReason,
    pub final_satisfaction: i32,
    pub mood: Mood,
    pub score: u32,
    pub max_combo: u32,
    pub perfect_count: u32,
    pub good_count: u32,
    pub bad_count: u32,
    pub hit_count: u32,
    pub miss_count: u32,
    pub stray_count: u32,
    pub total_notes: u32,
    pub accuracy_percent: u32,
}

impl SessionResult {
    pub fn from_ledger(
        house: HouseNumber,
        song: &str,
        success: bool,
        reason: EndReason,
        ledger: &SatisfactionLedger,
    ) -> Self {
        Self {
            house,
            song: song.to_string(),
            success,
            reason,
            final_satisfaction: ledger.satisfaction(),
            mood: Mood::from_satisfaction(ledger.satisfaction()),
            score: ledger.score(),
            max_combo: ledger.max_combo(),
            perfect_count: ledger.tier_count(HitTier::Perfect),
            good_count: ledger.tier_count(HitTier::Good),
            bad_count: ledger.tier_count(HitTier::Bad),
            hit_count: ledger.hit_count(),
            miss_count: ledger.miss_count(),
            stray_count: ledger.stray_count(),
            total_notes: ledger.total_notes(),
            accuracy_percent: ledger.accuracy_percent(),
        }
    }
}
