use rand::rngs::StdRng;

use crate::devices::types::{DeviceStatus, Reading, gaussian_noise, line_voltage, round2, uniform};

/// Simulated time advanced by one update step (s).
pub const TICK_SECS: f64 = 0.1;

/// Peak inrush current held right after start (A).
pub const INRUSH_PEAK_AMPS: f64 = 120.0;

/// Steady-state running current (A).
pub const STEADY_NOMINAL_AMPS: f64 = 42.5;

/// Sustained current of a locked rotor (A).
pub const LOCKED_ROTOR_AMPS: f64 = 110.0;

/// Decaying inrush at or below this level snaps to the steady nominal (A).
const SETTLE_THRESHOLD_AMPS: f64 = 45.0;

/// Duration the inrush peak is held before decay starts (s).
const PEAK_HOLD_SECS: f64 = 0.5;

/// Exponential decay time constant of the inrush (s).
const TIME_CONSTANT_SECS: f64 = 0.8;

/// Updates spent in `Starting` before the motor reports `Running` (3.5 s).
const STARTUP_TICKS: u32 = 35;

/// Industrial induction motor with a two-phase inrush model.
///
/// States:
/// - `off`: idle, zero voltage and current
/// - `starting`: inrush held at 120 A for 0.5 s, then exponential decay
///   toward 42.5 A; reports `running` after 3.5 s
/// - `running`: 40-45 A with Gaussian noise
/// - `fault`: locked rotor, 110 A sustained until turned off
#[derive(Debug, Clone, Default)]
pub struct Motor {
    /// Update steps taken since the last start.
    startup_ticks: u32,
}

impl Motor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds of simulated time spent in the current startup.
    pub fn startup_elapsed(&self) -> f64 {
        f64::from(self.startup_ticks) * TICK_SECS
    }

    /// Resets the startup timer; called on every start and stop.
    pub fn reset_startup(&mut self) {
        self.startup_ticks = 0;
    }

    /// Advances the motor by one tick, possibly moving `status` from
    /// `Starting` to `Running`.
    pub fn update(&mut self, status: &mut DeviceStatus, rng: &mut StdRng) -> Reading {
        match *status {
            DeviceStatus::Off => Reading::new(0.0, 0.0),
            DeviceStatus::Starting => {
                let current = self.inrush_current(rng);
                let voltage = line_voltage(rng, 2.0);

                self.startup_ticks += 1;
                if self.startup_ticks >= STARTUP_TICKS {
                    *status = DeviceStatus::Running;
                    self.startup_ticks = 0;
                }
                Reading::new(voltage, current)
            }
            DeviceStatus::Running => {
                let noisy = STEADY_NOMINAL_AMPS + gaussian_noise(rng, 1.0);
                let current = round2(noisy.clamp(40.0, 45.0));
                Reading::new(line_voltage(rng, 2.0), current)
            }
            DeviceStatus::Fault => {
                let current = round2(LOCKED_ROTOR_AMPS + uniform(rng, -0.5, 0.5));
                Reading::new(line_voltage(rng, 2.0), current)
            }
        }
    }

    fn inrush_current(&self, rng: &mut StdRng) -> f64 {
        let t = self.startup_elapsed();
        if t < PEAK_HOLD_SECS {
            return round2(INRUSH_PEAK_AMPS + uniform(rng, -0.5, 0.5));
        }

        let decay_time = t - PEAK_HOLD_SECS;
        let decayed =
            round2(INRUSH_PEAK_AMPS * (-decay_time / TIME_CONSTANT_SECS).exp() + STEADY_NOMINAL_AMPS);
        if decayed <= SETTLE_THRESHOLD_AMPS {
            STEADY_NOMINAL_AMPS
        } else {
            decayed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn run(motor: &mut Motor, status: &mut DeviceStatus, rng: &mut StdRng, ticks: usize) -> Vec<Reading> {
        (0..ticks).map(|_| motor.update(status, rng)).collect()
    }

    #[test]
    fn off_draws_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut status = DeviceStatus::Off;
        let r = Motor::new().update(&mut status, &mut rng);
        assert_eq!(r, Reading::new(0.0, 0.0));
        assert_eq!(status, DeviceStatus::Off);
    }

    #[test]
    fn peak_hold_for_first_half_second() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut motor = Motor::new();
        let mut status = DeviceStatus::Starting;
        let readings = run(&mut motor, &mut status, &mut rng, 5);
        for r in readings {
            assert!((119.5..=120.5).contains(&r.current), "current {}", r.current);
        }
        assert_eq!(status, DeviceStatus::Starting);
    }

    #[test]
    fn decay_is_monotonic_until_settled() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut motor = Motor::new();
        let mut status = DeviceStatus::Starting;
        let readings = run(&mut motor, &mut status, &mut rng, 35);

        // decay starts from peak plus nominal at t = 0.5 s
        let decay = &readings[5..];
        assert_eq!(decay[0].current, INRUSH_PEAK_AMPS + STEADY_NOMINAL_AMPS);
        for pair in decay.windows(2) {
            assert!(pair[1].current <= pair[0].current);
        }
    }

    #[test]
    fn transitions_to_running_after_startup() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut motor = Motor::new();
        let mut status = DeviceStatus::Starting;

        run(&mut motor, &mut status, &mut rng, 34);
        assert_eq!(status, DeviceStatus::Starting);
        assert!((motor.startup_elapsed() - 3.4).abs() < 1e-9);

        run(&mut motor, &mut status, &mut rng, 1);
        assert_eq!(status, DeviceStatus::Running);
        assert_eq!(motor.startup_elapsed(), 0.0);
    }

    #[test]
    fn running_current_is_clamped() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut motor = Motor::new();
        let mut status = DeviceStatus::Running;
        for r in run(&mut motor, &mut status, &mut rng, 500) {
            assert!((40.0..=45.0).contains(&r.current));
        }
    }

    #[test]
    fn fault_sustains_locked_rotor_current() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut motor = Motor::new();
        let mut status = DeviceStatus::Fault;
        for r in run(&mut motor, &mut status, &mut rng, 50) {
            assert!((109.5..=110.5).contains(&r.current));
        }
        assert_eq!(status, DeviceStatus::Fault);
    }
}
