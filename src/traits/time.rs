/// Microseconds per second. All timestamps in the crate are `i64` microseconds.
pub const US_PER_SEC: i64 = 1_000_000;
/// Microseconds per millisecond.
pub const US_PER_MS: i64 = 1_000;

/// Convert seconds (as found in beat maps) to microseconds, rounding to nearest.
pub fn secs_to_us(secs: f64) -> i64 {
    (secs * US_PER_SEC as f64).round() as i64
}

pub fn ms_to_us(ms: u64) -> i64 {
    ms as i64 * US_PER_MS
}

/// Convert microseconds back to seconds for display.
pub fn us_to_secs(us: i64) -> f64 {
    us as f64 / US_PER_SEC as f64
}

/// Abstraction over wall-clock sources.
/// Implementations: SystemTimeProvider (production), MockTimeProvider (testing).
pub trait TimeProvider {
    /// Current time in microseconds from an arbitrary epoch.
    fn now_us(&self) -> i64;
}

/// Wall clock backed by `std::time::Instant`, measured from construction.
pub struct SystemTimeProvider {
    start: std::time::Instant,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_us(&self) -> i64 {
        self.start.elapsed().as_micros() as i64
    }
}

/// Manually driven clock for deterministic tests and headless simulation.
#[derive(Debug, Default)]
pub struct MockTimeProvider {
    current_us: std::cell::Cell<i64>,
}

impl MockTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(us: i64) -> Self {
        Self {
            current_us: std::cell::Cell::new(us),
        }
    }

    pub fn set_time(&self, us: i64) {
        self.current_us.set(us);
    }

    /// Move the clock forward and return the new time.
    pub fn advance(&self, delta_us: i64) -> i64 {
        let next = self.current_us.get() + delta_us;
        self.current_us.set(next);
        next
    }

    pub fn advance_ms(&self, ms: u64) -> i64 {
        self.advance(ms_to_us(ms))
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_us(&self) -> i64 {
        self.current_us.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversions() {
        assert_eq!(secs_to_us(2.0), 2_000_000);
        assert_eq!(secs_to_us(0.3), 300_000);
        assert_eq!(ms_to_us(500), 500_000);
        assert!((us_to_secs(1_500_000) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn mock_time_provider_advance() {
        let tp = MockTimeProvider::new();
        assert_eq!(tp.now_us(), 0);
        assert_eq!(tp.advance(1_000_000), 1_000_000);
        assert_eq!(tp.advance_ms(500), 1_500_000);
        assert_eq!(tp.now_us(), 1_500_000);
    }

    #[test]
    fn mock_time_provider_starting_at() {
        let tp = MockTimeProvider::starting_at(5_000_000);
        assert_eq!(tp.now_us(), 5_000_000);
        tp.set_time(0);
        assert_eq!(tp.now_us(), 0);
    }

    #[test]
    fn system_time_provider_monotonic() {
        let tp = SystemTimeProvider::new();
        let t1 = tp.now_us();
        let t2 = tp.now_us();
        assert!(t2 >= t1);
    }
}
