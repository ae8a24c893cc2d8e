use serde::{Deserialize, Serialize};

use crate::play::judge::{HitTier, Judgement};

pub const MIN_SATISFACTION: i32 = 0;
pub const MAX_SATISFACTION: i32 = 100;

/// Score, combo and satisfaction accumulated over one session.
///
/// Satisfaction stays inside `MIN_SATISFACTION..=MAX_SATISFACTION` after
/// every change. Stray presses are counted apart from missed notes, so
/// `hit_count() + miss_count() <= total_notes()` holds throughout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatisfactionLedger {
    satisfaction: i32,
    score: u32,
    combo: u32,
    max_combo: u32,
    /// Hits per tier: [Perfect, Good, Bad].
    tier_counts: [u32; 3],
    miss_count: u32,
    stray_count: u32,
    total_notes: u32,
}

impl SatisfactionLedger {
    pub fn new(initial_satisfaction: i32, total_notes: u32) -> Self {
        Self {
            satisfaction: initial_satisfaction.clamp(MIN_SATISFACTION, MAX_SATISFACTION),
            score: 0,
            combo: 0,
            max_combo: 0,
            tier_counts: [0; 3],
            miss_count: 0,
            stray_count: 0,
            total_notes,
        }
    }

    /// Apply one judgement.
    pub fn apply(&mut self, judgement: Judgement) {
        match judgement {
            Judgement::Hit(tier) => self.tier_counts[tier_index(tier)] += 1,
            Judgement::Miss => self.miss_count += 1,
            Judgement::Stray => self.stray_count += 1,
        }

        self.score += judgement.score();
        if judgement.keeps_combo() {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        } else {
            self.combo = 0;
        }
        self.satisfaction = (self.satisfaction + judgement.satisfaction_delta())
            .clamp(MIN_SATISFACTION, MAX_SATISFACTION);
    }

    pub fn satisfaction(&self) -> i32 {
        self.satisfaction
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn tier_count(&self, tier: HitTier) -> u32 {
        self.tier_counts[tier_index(tier)]
    }

    pub fn hit_count(&self) -> u32 {
        self.tier_counts.iter().sum()
    }

    pub fn miss_count(&self) -> u32 {
        self.miss_count
    }

    pub fn stray_count(&self) -> u32 {
        self.stray_count
    }

    pub fn total_notes(&self) -> u32 {
        self.total_notes
    }

    /// Notes that have been hit or missed.
    pub fn processed(&self) -> u32 {
        self.hit_count() + self.miss_count
    }

    pub fn all_processed(&self) -> bool {
        self.processed() >= self.total_notes
    }

    pub fn is_failed(&self) -> bool {
        self.satisfaction <= MIN_SATISFACTION
    }

    /// Hit notes as a rounded percentage of all notes; 0 for an empty map.
    pub fn accuracy_percent(&self) -> u32 {
        if self.total_notes == 0 {
            return 0;
        }
        (self.hit_count() as f64 / self.total_notes as f64 * 100.0).round() as u32
    }

    /// Whether the song is over from the scoring point of view.
    ///
    /// Either the audio reported its end, or playback is within `grace_us`
    /// of the song's length. Both also require every note to be processed
    /// and none in flight.
    pub fn is_complete(
        &self,
        song_ended: bool,
        active_notes: usize,
        position_us: i64,
        song_duration_us: i64,
        grace_us: i64,
    ) -> bool {
        let settled = self.all_processed() && active_notes == 0;
        settled && (song_ended || position_us > song_duration_us - grace_us)
    }
}

fn tier_index(tier: HitTier) -> usize {
    match tier {
        HitTier::Perfect => 0,
        HitTier::Good => 1,
        HitTier::Bad => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_satisfaction_is_clamped() {
        assert_eq!(SatisfactionLedger::new(150, 0).satisfaction(), 100);
        assert_eq!(SatisfactionLedger::new(-5, 0).satisfaction(), 0);
    }

    #[test]
    fn perfect_at_ceiling_stays_at_100() {
        let mut ledger = SatisfactionLedger::new(95, 3);
        ledger.apply(Judgement::Hit(HitTier::Perfect));
        assert_eq!(ledger.satisfaction(), 100);
        ledger.apply(Judgement::Hit(HitTier::Perfect));
        assert_eq!(ledger.satisfaction(), 100);
        assert_eq!(ledger.score(), 200);
    }

    #[test]
    fn bad_extends_combo_miss_resets() {
        let mut ledger = SatisfactionLedger::new(50, 4);
        ledger.apply(Judgement::Hit(HitTier::Perfect));
        ledger.apply(Judgement::Hit(HitTier::Bad));
        assert_eq!(ledger.combo(), 2);
        assert_eq!(ledger.satisfaction(), 50);
        ledger.apply(Judgement::Miss);
        assert_eq!(ledger.combo(), 0);
        assert_eq!(ledger.max_combo(), 2);
        assert_eq!(ledger.satisfaction(), 40);
    }

    #[test]
    fn stray_counts_separately() {
        let mut ledger = SatisfactionLedger::new(50, 1);
        ledger.apply(Judgement::Stray);
        assert_eq!(ledger.stray_count(), 1);
        assert_eq!(ledger.miss_count(), 0);
        assert_eq!(ledger.processed(), 0);
        assert!(!ledger.all_processed());
        assert_eq!(ledger.satisfaction(), 40);
    }

    #[test]
    fn failure_at_zero() {
        let mut ledger = SatisfactionLedger::new(10, 2);
        assert!(!ledger.is_failed());
        ledger.apply(Judgement::Miss);
        assert!(ledger.is_failed());
        ledger.apply(Judgement::Miss);
        assert_eq!(ledger.satisfaction(), 0);
    }

    #[test]
    fn accuracy_rounds() {
        let mut ledger = SatisfactionLedger::new(50, 3);
        assert_eq!(ledger.accuracy_percent(), 0);
        ledger.apply(Judgement::Hit(HitTier::Good));
        ledger.apply(Judgement::Hit(HitTier::Good));
        ledger.apply(Judgement::Miss);
        assert_eq!(ledger.accuracy_percent(), 67);
        assert_eq!(ledger.tier_count(HitTier::Good), 2);
        assert_eq!(SatisfactionLedger::new(50, 0).accuracy_percent(), 0);
    }

    #[test]
    fn completion_conditions() {
        let mut ledger = SatisfactionLedger::new(50, 1);
        // Unprocessed notes block completion.
        assert!(!ledger.is_complete(true, 0, 0, 10_000_000, 1_000_000));

        ledger.apply(Judgement::Hit(HitTier::Perfect));
        assert!(!ledger.is_complete(true, 1, 0, 10_000_000, 1_000_000));
        assert!(ledger.is_complete(true, 0, 0, 10_000_000, 1_000_000));

        // Without the end notification, position must pass duration - grace.
        assert!(!ledger.is_complete(false, 0, 9_000_000, 10_000_000, 1_000_000));
        assert!(ledger.is_complete(false, 0, 9_000_001, 10_000_000, 1_000_000));
    }
}
