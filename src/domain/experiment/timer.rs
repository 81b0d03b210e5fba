//! Timing collaborators for behavior executions

use std::fmt;
use std::time::{Duration, Instant};

/// Monotonic time source
pub trait Clock: Send + Sync + fmt::Debug {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Stopwatch started on construction
pub struct Timer<'a> {
    clock: &'a dyn Clock,
    started: Duration,
}

impl<'a> Timer<'a> {
    /// Start timing against the given clock
    pub fn start(clock: &'a dyn Clock) -> Self {
        Self {
            clock,
            started: clock.now(),
        }
    }

    /// Elapsed time since the timer started
    pub fn stop(&self) -> Duration {
        self.clock.now().saturating_sub(self.started)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Clock that advances a fixed step every time it is read
    #[derive(Debug, Default)]
    pub(crate) struct SteppingClock {
        step_ms: u64,
        ticks: AtomicU64,
    }

    impl SteppingClock {
        pub(crate) fn new(step_ms: u64) -> Self {
            Self {
                step_ms,
                ticks: AtomicU64::new(0),
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> Duration {
            let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
            Duration::from_millis(tick * self.step_ms)
        }
    }

    #[test]
    fn test_timer_measures_clock_delta() {
        let clock = SteppingClock::new(10);
        let timer = Timer::start(&clock);

        assert_eq!(timer.stop(), Duration::from_millis(10));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        let second = clock.now();

        assert!(second >= first);
    }

    #[test]
    fn test_system_timer_elapsed() {
        let clock = SystemClock::new();
        let timer = Timer::start(&clock);
        std::thread::sleep(Duration::from_millis(2));

        assert!(timer.stop() >= Duration::from_millis(2));
    }
}
