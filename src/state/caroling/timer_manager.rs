use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::play::note_spawner::NoteId;

/// Something scheduled on the session clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Countdown display; 0 means "GO".
    Countdown(u32),
    BeginPlay,
    /// Spawn the beat map note at this index.
    Spawn(usize),
    /// The note reaches the hit line.
    Expire(NoteId),
    /// Settle delay after the completion check passed.
    FinishDelay,
    SafetyTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTimer {
    pub due_us: i64,
    pub kind: TimerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    due_us: i64,
    seq: u64,
    kind: TimerKind,
}

/// Timer queue keyed by session time (microseconds).
///
/// Timers fire in due order. Timers with the same due time fire in the order
/// they were scheduled.
#[derive(Debug, Default)]
pub struct TimerManager {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl TimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_us: i64, kind: TimerKind) {
        self.next_seq += 1;
        self.heap.push(Reverse(Entry {
            due_us,
            seq: self.next_seq,
            kind,
        }));
    }

    /// Pop the earliest timer due at or before `limit_us`.
    pub fn pop_until(&mut self, limit_us: i64) -> Option<DueTimer> {
        let Reverse(next) = self.heap.peek()?;
        if next.due_us > limit_us {
            return None;
        }
        self.heap.pop().map(|Reverse(e)| DueTimer {
            due_us: e.due_us,
            kind: e.kind,
        })
    }

    /// Due time of the earliest pending timer.
    pub fn next_due_us(&self) -> Option<i64> {
        self.heap.peek().map(|Reverse(e)| e.due_us)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Cancel everything, returning how many timers were pending.
    pub fn clear(&mut self) -> usize {
        let pending = self.heap.len();
        self.heap.clear();
        pending
    }
}
