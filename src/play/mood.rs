use serde::{Deserialize, Serialize};

/// The listener's mood, derived from satisfaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Neutral,
    Angry,
    Furious,
}

impl Mood {
    pub fn from_satisfaction(satisfaction: i32) -> Self {
        if satisfaction >= 70 {
            Self::Happy
        } else if satisfaction >= 40 {
            Self::Neutral
        } else if satisfaction >= 20 {
            Self::Angry
        } else {
            Self::Furious
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Neutral => "neutral",
            Self::Angry => "angry",
            Self::Furious => "furious",
        }
    }
}
