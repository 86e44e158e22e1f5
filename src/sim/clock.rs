use chrono::{Local, Timelike};
use parking_lot::Mutex;

/// Source of wall-clock time for the simulation.
///
/// Device timestamps come from [`Clock::unix_time`]; the grid context bands
/// are chosen from [`Clock::local_hour`].
pub trait Clock: Send + Sync {
    /// Current time in Unix seconds.
    fn unix_time(&self) -> f64;

    /// Current local hour of day (0-23).
    fn local_hour(&self) -> u32;
}

/// Clock backed by the operating system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_time(&self) -> f64 {
        Local::now().timestamp_micros() as f64 / 1e6
    }

    fn local_hour(&self) -> u32 {
        Local::now().hour()
    }
}

/// A settable clock for tests and replays.
///
/// # Examples
///
/// ```
/// use gridsense_sim::sim::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_700_000_000.0, 12);
/// clock.advance(0.1);
/// clock.set_hour(20);
/// assert_eq!(clock.local_hour(), 20);
/// assert!((clock.unix_time() - 1_700_000_000.1).abs() < 1e-6);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<(f64, u32)>,
}

impl ManualClock {
    /// Creates a clock at `unix_time` seconds reporting `hour` as the local hour.
    pub fn new(unix_time: f64, hour: u32) -> Self {
        Self {
            state: Mutex::new((unix_time, hour % 24)),
        }
    }

    /// Moves time forward by `secs` seconds without changing the hour.
    pub fn advance(&self, secs: f64) {
        self.state.lock().0 += secs;
    }

    pub fn set_hour(&self, hour: u32) {
        self.state.lock().1 = hour % 24;
    }
}

impl Clock for ManualClock {
    fn unix_time(&self) -> f64 {
        self.state.lock().0
    }

    fn local_hour(&self) -> u32 {
        self.state.lock().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_reports_valid_hour() {
        let clock = SystemClock;
        assert!(clock.local_hour() < 24);
        assert!(clock.unix_time() > 1_600_000_000.0);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(100.0, 3);
        clock.advance(2.5);
        assert_eq!(clock.unix_time(), 102.5);
        assert_eq!(clock.local_hour(), 3);
    }

    #[test]
    fn manual_clock_wraps_hour() {
        let clock = ManualClock::new(0.0, 25);
        assert_eq!(clock.local_hour(), 1);
    }
}
