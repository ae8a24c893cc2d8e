use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::traits::time::{secs_to_us, us_to_secs};
use crate::util::error::{AssetLoadError, BeatMapError};

/// Number of note lanes.
pub const LANE_COUNT: usize = 4;

/// Visual note length when a beat map omits it.
pub const DEFAULT_NOTE_DURATION_SECS: f64 = 0.3;

/// Latest accepted note time. One day is far past any carol.
pub const MAX_NOTE_TIME_SECS: f64 = 86_400.0;

/// A single scheduled note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub lane: usize,
    /// Target time from song start in microseconds.
    pub time_us: i64,
    /// Visual length only; does not affect judgement.
    pub duration_us: i64,
}

impl NoteEvent {
    pub fn new(lane: usize, time_us: i64) -> Self {
        Self {
            lane,
            time_us,
            duration_us: secs_to_us(DEFAULT_NOTE_DURATION_SECS),
        }
    }
}

/// Immutable note schedule for one song. Notes keep file order and are not
/// required to be sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeatMap {
    notes: Vec<NoteEvent>,
    pub title: Option<String>,
    pub bpm: Option<f64>,
}

impl BeatMap {
    pub fn new(notes: Vec<NoteEvent>) -> Self {
        Self {
            notes,
            title: None,
            bpm: None,
        }
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Latest target time, regardless of file order.
    pub fn last_note_time_us(&self) -> Option<i64> {
        self.notes.iter().map(|n| n.time_us).max()
    }

    /// Serialize back to the on-disk JSON shape.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let doc = BeatMapDocument {
            notes: Some(
                self.notes
                    .iter()
                    .map(|n| NoteDocument {
                        lane: n.lane as i64,
                        time: us_to_secs(n.time_us),
                        duration: us_to_secs(n.duration_us),
                    })
                    .collect(),
            ),
            title: self.title.clone(),
            bpm: self.bpm,
        };
        serde_json::to_string_pretty(&doc)
    }
}

// On-disk shape: {"notes": [{"lane": 0, "time": 1.25, "duration": 0.3}, ...]}
#[derive(Debug, Serialize, Deserialize)]
struct BeatMapDocument {
    #[serde(default)]
    notes: Option<Vec<NoteDocument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bpm: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NoteDocument {
    lane: i64,
    time: f64,
    #[serde(default = "default_duration")]
    duration: f64,
}

fn default_duration() -> f64 {
    DEFAULT_NOTE_DURATION_SECS
}

/// Loads beat maps from JSON files.
pub struct BeatMapLoader;

impl BeatMapLoader {
    pub fn load(path: &Path) -> Result<BeatMap, BeatMapError> {
        let text = std::fs::read_to_string(path).map_err(|e| AssetLoadError::from_io(path, e))?;
        let map = Self::parse_str(&text, path)?;
        debug!("Loaded beat map {} ({} notes)", path.display(), map.len());
        Ok(map)
    }

    /// Parse a beat map document. `origin` is only used in error reports.
    ///
    /// Invalid JSON is an asset decode failure. Valid JSON without a usable
    /// `notes` list is malformed.
    pub fn parse_str(text: &str, origin: &Path) -> Result<BeatMap, BeatMapError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| AssetLoadError::Decode {
                path: origin.to_path_buf(),
                message: e.to_string(),
            })?;

        let malformed = |reason: String| BeatMapError::Malformed {
            path: origin.to_path_buf(),
            reason,
        };

        let doc: BeatMapDocument =
            serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
        let raw_notes = doc
            .notes
            .ok_or_else(|| malformed("missing notes list".to_string()))?;

        let mut notes = Vec::with_capacity(raw_notes.len());
        for (i, raw) in raw_notes.into_iter().enumerate() {
            if raw.lane < 0 || raw.lane >= LANE_COUNT as i64 {
                return Err(malformed(format!("note {i} has invalid lane {}", raw.lane)));
            }
            if !(0.0..=MAX_NOTE_TIME_SECS).contains(&raw.time) {
                return Err(malformed(format!("note {i} has invalid time {}", raw.time)));
            }
            let duration = if (0.0..=MAX_NOTE_TIME_SECS).contains(&raw.duration) {
                raw.duration
            } else {
                DEFAULT_NOTE_DURATION_SECS
            };
            notes.push(NoteEvent {
                lane: raw.lane as usize,
                time_us: secs_to_us(raw.time),
                duration_us: secs_to_us(duration),
            });
        }

        Ok(BeatMap {
            notes,
            title: doc.title,
            bpm: doc.bpm,
        })
    }
}
