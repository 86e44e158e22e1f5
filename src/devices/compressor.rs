use rand::rngs::StdRng;

use crate::devices::types::{DeviceStatus, Reading, line_voltage, uniform};

/// Industrial air compressor charging a receiver tank to a target pressure.
///
/// While running it draws 25-30 A to build pressure and 5-8 A to hold it.
/// While off the tank leaks 1 PSI per tick down to zero.
#[derive(Debug, Clone)]
pub struct Compressor {
    /// Tank pressure (PSI, never negative).
    pub pressure: f64,
    /// Pressure the compressor charges to (PSI).
    pub target_pressure: f64,
}

impl Default for Compressor {
    fn default() -> Self {
        Self {
            pressure: 0.0,
            target_pressure: 120.0,
        }
    }
}

impl Compressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the compressor by one tick. Returns `None` while off.
    pub fn update(&mut self, status: DeviceStatus, rng: &mut StdRng) -> Option<Reading> {
        if status != DeviceStatus::Running {
            self.pressure = (self.pressure - 1.0).max(0.0);
            return None;
        }

        let current = if self.pressure < self.target_pressure {
            self.pressure += 2.0;
            uniform(rng, 25.0, 30.0)
        } else {
            self.pressure = (self.pressure + uniform(rng, -0.5, 0.5)).max(0.0);
            uniform(rng, 5.0, 8.0)
        };

        Some(Reading::new(line_voltage(rng, 2.0), current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn charges_two_psi_per_tick() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut c = Compressor::new();
        for tick in 1..=60 {
            let r = c.update(DeviceStatus::Running, &mut rng);
            assert_eq!(c.pressure, 2.0 * f64::from(tick));
            let current = r.map(|r| r.current).unwrap_or_default();
            assert!((25.0..=30.0).contains(&current));
        }
    }

    #[test]
    fn maintains_at_target() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut c = Compressor {
            pressure: 120.0,
            ..Compressor::default()
        };
        let before = c.pressure;
        let r = c.update(DeviceStatus::Running, &mut rng);
        let current = r.map(|r| r.current).unwrap_or_default();
        assert!((5.0..=8.0).contains(&current));
        assert!((c.pressure - before).abs() <= 0.5);
    }

    #[test]
    fn leaks_while_off_and_floors_at_zero() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut c = Compressor {
            pressure: 2.5,
            ..Compressor::default()
        };
        assert!(c.update(DeviceStatus::Off, &mut rng).is_none());
        assert_eq!(c.pressure, 1.5);
        c.update(DeviceStatus::Off, &mut rng);
        c.update(DeviceStatus::Off, &mut rng);
        assert_eq!(c.pressure, 0.0);
    }
}
