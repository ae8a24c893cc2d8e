pub mod error;
pub mod logging;

pub use error::{AssetLoadError, BeatMapError, SessionError, UserError};
pub use logging::init_logging;
