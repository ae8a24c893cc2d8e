mod progress;

pub use progress::{ProgressSnapshot, RunOutcome, RunProgress};
