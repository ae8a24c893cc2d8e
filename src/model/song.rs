use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// House numbers run from 1 to 6.
pub type HouseNumber = u8;

pub const HOUSE_COUNT: HouseNumber = 6;

/// A song that can be sung at a house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRef {
    pub name: String,
    /// Audio asset path, relative to the asset root.
    pub audio: PathBuf,
    /// Beat map asset path, relative to the asset root.
    pub beat_map: PathBuf,
}

impl SongRef {
    pub fn new(name: &str, audio: &str, beat_map: &str) -> Self {
        Self {
            name: name.to_string(),
            audio: PathBuf::from(audio),
            beat_map: PathBuf::from(beat_map),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
    VeryHard,
    Extreme,
    Master,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Moderate => "moderate",
            Self::Hard => "hard",
            Self::VeryHard => "very hard",
            Self::Extreme => "extreme",
            Self::Master => "master",
        }
    }

    /// Default difficulty for a house, rising with the house number.
    pub fn for_house(house: HouseNumber) -> Option<Self> {
        match house {
            1 => Some(Self::Easy),
            2 => Some(Self::Moderate),
            3 => Some(Self::Hard),
            4 => Some(Self::VeryHard),
            5 => Some(Self::Extreme),
            6 => Some(Self::Master),
            _ => None,
        }
    }
}

/// Everything the minigame needs to know about one house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseDef {
    pub number: HouseNumber,
    pub difficulty: Difficulty,
    /// Lowest starting satisfaction; the actual start adds 0..=10.
    pub satisfaction_base: i32,
    pub songs: Vec<SongRef>,
}

/// The village's six houses with their stock songs.
pub fn default_houses() -> Vec<HouseDef> {
    let songs = [
        SongRef::new(
            "Silent Night",
            "music/easy/Silent Night.mp3",
            "music/easy/silent_night.json",
        ),
        SongRef::new(
            "Carol of the Bells",
            "music/easy/carol of the bells.mp3",
            "music/easy/carol_of_the_bells.json",
        ),
        SongRef::new(
            "Caroling Divas",
            "music/moderate/Caroling Divas.mp3",
            "music/moderate/caroling_divas.json",
        ),
        SongRef::new(
            "Jingle Bells Twist",
            "music/moderate/jingle bells (twist).mp3",
            "music/moderate/jingle_bells_(twist).json",
        ),
        SongRef::new(
            "Rockin Around",
            "music/hard/Rockin Around The Christmas Tree.mp3",
            "music/hard/rockin_around_the_christmas_tree.json",
        ),
        SongRef::new(
            "Arizona B",
            "music/hard/Arizona B (Christmas Version).mp3",
            "music/hard/arizona_b_(christmas_version).json",
        ),
    ];

    songs
        .into_iter()
        .zip(1..=HOUSE_COUNT)
        .map(|(song, number)| HouseDef {
            number,
            difficulty: Difficulty::for_house(number).unwrap_or(Difficulty::Master),
            satisfaction_base: match number {
                1..=3 => 50,
                4 | 5 => 40,
                _ => 35,
            },
            songs: vec![song],
        })
        .collect()
}

/// Immutable lookup of houses by number.
#[derive(Debug, Clone, Default)]
pub struct SongCatalog {
    houses: BTreeMap<HouseNumber, HouseDef>,
}

impl SongCatalog {
    pub fn new(houses: Vec<HouseDef>) -> Self {
        Self {
            houses: houses.into_iter().map(|h| (h.number, h)).collect(),
        }
    }

    pub fn house(&self, number: HouseNumber) -> Option<&HouseDef> {
        self.houses.get(&number)
    }

    pub fn songs(&self, number: HouseNumber) -> Option<&[SongRef]> {
        self.house(number).map(|h| h.songs.as_slice())
    }

    pub fn house_numbers(&self) -> impl Iterator<Item = HouseNumber> + '_ {
        self.houses.keys().copied()
    }
}
