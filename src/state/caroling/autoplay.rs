//! Autoplay: scripted presses that play a beat map at a chosen accuracy.

use rand::Rng;

use crate::model::beat_map::BeatMap;
use crate::play::judge::HitTier;
use crate::state::caroling::caroling_session::SessionSettings;
use crate::traits::input::{KeyEvent, ScriptedInput};

/// How accurately autoplay hits notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AutoplayProfile {
    /// Every note dead on the hit line.
    #[default]
    Perfect,
    /// Every note inside the Good tier.
    Good,
    /// Every note inside the Bad tier.
    Bad,
    /// Never press.
    Miss,
    /// Mostly Perfect with some Good, Bad and missed notes.
    Mixed,
}

impl AutoplayProfile {
    /// Tier to aim for on the next note, or `None` to let it pass.
    fn pick<R: Rng>(self, rng: &mut R) -> Option<HitTier> {
        match self {
            Self::Perfect => Some(HitTier::Perfect),
            Self::Good => Some(HitTier::Good),
            Self::Bad => Some(HitTier::Bad),
            Self::Miss => None,
            Self::Mixed => match rng.gen_range(0..100) {
                0..60 => Some(HitTier::Perfect),
                60..85 => Some(HitTier::Good),
                85..95 => Some(HitTier::Bad),
                _ => None,
            },
        }
    }
}

/// Build presses for a session entered at wall time `entered_at_us`,
/// assuming it is never paused.
pub fn plan_presses<R: Rng>(
    beat_map: &BeatMap,
    settings: &SessionSettings,
    entered_at_us: i64,
    profile: AutoplayProfile,
    rng: &mut R,
) -> ScriptedInput {
    let play_start = entered_at_us + settings.play_start_offset_us();
    let window = &settings.window;

    let events = beat_map
        .notes()
        .iter()
        .filter_map(|note| {
            let early_by = match profile.pick(rng)? {
                HitTier::Perfect => 0,
                HitTier::Good => (window.perfect_us() + window.good_us()) / 2,
                HitTier::Bad => (window.good_us() + window.hit_us()) / 2,
            };
            let arrival = play_start + note.time_us.max(settings.lead_us);
            Some(KeyEvent {
                lane: note.lane,
                time_us: arrival - early_by,
            })
        })
        .collect();

    ScriptedInput::new(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::beat_map::NoteEvent;
    use crate::traits::input::InputProvider;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn map() -> BeatMap {
        BeatMap::new(vec![NoteEvent::new(0, 1_000_000), NoteEvent::new(3, 6_000_000)])
    }

    #[test]
    fn perfect_presses_on_arrival() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut input = plan_presses(
            &map(),
            &SessionSettings::default(),
            100,
            AutoplayProfile::Perfect,
            &mut rng,
        );
        let presses = input.poll_events(i64::MAX);
        // Early notes arrive one lead after play start.
        assert_eq!(presses[0].time_us, 100 + 4_000_000 + 2_000_000);
        assert_eq!(presses[1].time_us, 100 + 4_000_000 + 6_000_000);
        assert_eq!(presses[1].lane, 3);
    }

    #[test]
    fn good_and_bad_press_early() {
        let mut rng = StdRng::seed_from_u64(1);
        let settings = SessionSettings::default();
        let mut good = plan_presses(&map(), &settings, 0, AutoplayProfile::Good, &mut rng);
        assert_eq!(good.poll_events(i64::MAX)[1].time_us, 10_000_000 - 150_000);
        let mut bad = plan_presses(&map(), &settings, 0, AutoplayProfile::Bad, &mut rng);
        assert_eq!(bad.poll_events(i64::MAX)[1].time_us, 10_000_000 - 300_000);
    }

    #[test]
    fn miss_profile_never_presses() {
        let mut rng = StdRng::seed_from_u64(1);
        let input = plan_presses(
            &map(),
            &SessionSettings::default(),
            0,
            AutoplayProfile::Miss,
            &mut rng,
        );
        assert_eq!(input.remaining(), 0);
    }
}
