pub mod judge;
pub mod ledger;
pub mod mood;
pub mod note_spawner;

pub use judge::{HitTier, JudgeWindow, Judgement};
pub use ledger::SatisfactionLedger;
pub use mood::Mood;
pub use note_spawner::{ActiveNote, NoteId, NoteSpawner};
