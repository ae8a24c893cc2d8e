use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure to fetch or decode an audio or beat-map asset.
///
/// Never retried. Returned from `CarolingGame::start_session` without
/// costing the player a life.
#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("Asset not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read asset: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode asset {path}: {message}")]
    Decode { path: PathBuf, message: String },
}

impl AssetLoadError {
    /// Classify an I/O failure for `path`.
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path } | Self::Read { path, .. } | Self::Decode { path, .. } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum BeatMapError {
    #[error(transparent)]
    Asset(#[from] AssetLoadError),

    /// The document parsed but does not describe a usable note list.
    #[error("Malformed beat map {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Reasons a caroling session cannot be started.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Unknown house: {0}")]
    UnknownHouse(u8),

    #[error("House {0} has no songs configured")]
    EmptySongPool(u8),

    #[error("A caroling session is already active")]
    AlreadyActive,

    #[error("The run is over, start a new run first")]
    GameOver,

    #[error(transparent)]
    Asset(#[from] AssetLoadError),
}

/// User-friendly error messages for the overworld error banner.
pub struct UserError;

impl UserError {
    /// Get user-friendly message for a missing song file.
    pub fn song_not_found(path: &Path) -> String {
        format!(
            "Song file not found: {}\nThe carolers could not find their sheet music.",
            path.display()
        )
    }

    /// Get user-friendly message for an unreadable or undecodable song.
    pub fn song_load_error(path: &Path) -> String {
        format!(
            "Failed to load song: {}\nThe carolers lost their voices. Try another house.",
            path.display()
        )
    }

    pub fn beat_map_malformed() -> &'static str {
        "The song's beat map is damaged\nThe neighbours were not impressed."
    }

    pub fn session_busy() -> &'static str {
        "Already caroling\nFinish the current song first."
    }

    pub fn game_over() -> &'static str {
        "Out of lives\nStart a new run to keep caroling."
    }

    /// Map any session start failure to its banner text.
    pub fn for_session_error(err: &SessionError) -> String {
        match err {
            SessionError::UnknownHouse(house) => format!("Nobody lives at house {house}"),
            SessionError::EmptySongPool(house) => {
                format!("House {house} has no songs to sing")
            }
            SessionError::AlreadyActive => Self::session_busy().to_string(),
            SessionError::GameOver => Self::game_over().to_string(),
            SessionError::Asset(AssetLoadError::NotFound { path }) => Self::song_not_found(path),
            SessionError::Asset(asset) => Self::song_load_error(asset.path()),
        }
    }
}
