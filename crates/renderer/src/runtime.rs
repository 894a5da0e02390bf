use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Abstraction over where frame timestamps originate from.
pub trait Clock {
    /// Monotonic timestamp in milliseconds.
    fn now_millis(&self) -> f64;
}

/// Clock backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same timestamp, so a test can keep one handle while the
/// driver owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(millis: f64) -> Self {
        Self {
            millis: Rc::new(Cell::new(millis)),
        }
    }

    pub fn set_millis(&self, millis: f64) {
        self.millis.set(millis);
    }

    pub fn set_seconds(&self, seconds: f64) {
        self.millis.set(seconds * 1000.0);
    }

    pub fn advance_millis(&self, millis: f64) {
        self.millis.set(self.millis.get() + millis);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> f64 {
        self.millis.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now_millis();
        let second = clock.now_millis();
        assert!(first >= 0.0);
        assert!(second >= first);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(5.0);
        let handle = clock.clone();
        handle.advance_millis(10.0);
        assert_eq!(clock.now_millis(), 15.0);
        handle.set_seconds(0.25);
        assert_eq!(clock.now_millis(), 250.0);
    }
}
