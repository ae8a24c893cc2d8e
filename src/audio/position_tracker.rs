/// Playback position derived from wall-clock arithmetic.
///
/// Audio output services only report when a voice ends, so the position is
/// tracked as `now - start`, with the start shifted by the offset the voice
/// began at. Also used as the session's pausable clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackTracker {
    state: TrackerState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum TrackerState {
    #[default]
    Idle,
    Running {
        start_us: i64,
    },
    Paused {
        elapsed_us: i64,
    },
}

impl PlaybackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin tracking as if playback started `offset_us` ago.
    pub fn start(&mut self, offset_us: i64, now_us: i64) {
        self.state = TrackerState::Running {
            start_us: now_us - offset_us,
        };
    }

    /// Elapsed playback time. 0 before `start`, frozen while paused.
    pub fn elapsed(&self, now_us: i64) -> i64 {
        match self.state {
            TrackerState::Idle => 0,
            TrackerState::Running { start_us } => now_us - start_us,
            TrackerState::Paused { elapsed_us } => elapsed_us,
        }
    }

    /// Freeze the position and return it as the resume offset.
    pub fn pause(&mut self, now_us: i64) -> i64 {
        let elapsed_us = self.elapsed(now_us);
        if let TrackerState::Running { .. } = self.state {
            self.state = TrackerState::Paused { elapsed_us };
        }
        elapsed_us
    }

    /// Continue from the frozen position. No-op unless paused.
    pub fn resume(&mut self, now_us: i64) {
        if let TrackerState::Paused { elapsed_us } = self.state {
            self.start(elapsed_us, now_us);
        }
    }

    pub fn reset(&mut self) {
        self.state = TrackerState::Idle;
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TrackerState::Running { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, TrackerState::Paused { .. })
    }
}
