use log::trace;

use crate::play::judge::{HitTier, JudgeWindow};

/// Identifier unique to one spawned note within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub u64);

/// A note currently falling toward the hit line.
///
/// Resolved notes are removed from the spawner immediately, so every
/// `ActiveNote` observed is unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveNote {
    pub id: NoteId,
    pub lane: usize,
    /// Session time the note appeared, in microseconds.
    pub spawn_us: i64,
    /// Session time the note reaches the hit line.
    pub arrival_us: i64,
    /// Visual length carried over from the beat map.
    pub duration_us: i64,
}

/// Owns the falling notes and matches presses against them.
#[derive(Debug)]
pub struct NoteSpawner {
    lead_us: i64,
    window: JudgeWindow,
    active: Vec<ActiveNote>,
    next_id: u64,
}

impl NoteSpawner {
    pub fn new(lead_us: i64, window: JudgeWindow) -> Self {
        Self {
            lead_us,
            window,
            active: Vec::new(),
            next_id: 0,
        }
    }

    pub fn lead_us(&self) -> i64 {
        self.lead_us
    }

    /// Offset from play start at which a note targeting `note_time_us` appears.
    /// Notes earlier than the lead appear immediately.
    pub fn spawn_offset_us(&self, note_time_us: i64) -> i64 {
        (note_time_us - self.lead_us).max(0)
    }

    /// Put a note on the track at `now_us`. It arrives one lead later.
    pub fn spawn(&mut self, lane: usize, duration_us: i64, now_us: i64) -> ActiveNote {
        self.next_id += 1;
        let note = ActiveNote {
            id: NoteId(self.next_id),
            lane,
            spawn_us: now_us,
            arrival_us: now_us.saturating_add(self.lead_us),
            duration_us,
        };
        trace!("spawn note {:?} lane {} arrival {}", note.id, lane, note.arrival_us);
        self.active.push(note);
        note
    }

    /// Judge a press in `lane` at `now_us`.
    ///
    /// The unresolved note nearest its arrival wins, provided the press is
    /// strictly inside the hit window; ties go to the earliest spawned note.
    /// The matched note is removed. `None` means the press was stray.
    pub fn judge_press(&mut self, lane: usize, now_us: i64) -> Option<(ActiveNote, HitTier)> {
        let (index, tier) = self
            .active
            .iter()
            .enumerate()
            .filter(|(_, n)| n.lane == lane)
            .filter_map(|(i, n)| {
                let offset = now_us - n.arrival_us;
                self.window
                    .classify(offset)
                    .map(|tier| (i, tier, offset.abs(), n.spawn_us, n.id))
            })
            .min_by_key(|&(_, _, distance, spawn_us, id)| (distance, spawn_us, id))
            .map(|(i, tier, ..)| (i, tier))?;

        Some((self.active.remove(index), tier))
    }

    /// Remove a note that reached the hit line unplayed. Returns `None` when
    /// the note was already resolved.
    pub fn expire(&mut self, id: NoteId) -> Option<ActiveNote> {
        let index = self.active.iter().position(|n| n.id == id)?;
        Some(self.active.remove(index))
    }

    pub fn active(&self) -> &[ActiveNote] {
        &self.active
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Drop every in-flight note, returning how many were cleared.
    pub fn clear(&mut self) -> usize {
        let cleared = self.active.len();
        self.active.clear();
        cleared
    }
}
