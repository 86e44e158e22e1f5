use rand::rngs::StdRng;

use crate::devices::types::{DeviceStatus, Reading, gaussian_noise, line_voltage};

/// Temperature change per update while running (°C).
const DRIFT_PER_TICK: f64 = 0.1;

/// HVAC unit whose compressor speed follows the distance to its setpoint.
///
/// Current is 5 A standby plus up to 15 A of compressor load; the room
/// temperature drifts toward the target while the unit runs.
#[derive(Debug, Clone)]
pub struct Hvac {
    /// Setpoint temperature (°C).
    pub target_temp: f64,
    /// Current room temperature (°C).
    pub current_temp: f64,
    /// Compressor speed (0-100 %).
    pub compressor_speed: f64,
}

impl Default for Hvac {
    fn default() -> Self {
        Self {
            target_temp: 22.0,
            current_temp: 25.0,
            compressor_speed: 0.0,
        }
    }
}

impl Hvac {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the compressor.
    pub fn shut_down(&mut self) {
        self.compressor_speed = 0.0;
    }

    /// Advances the unit by one tick. Returns `None` while off, leaving
    /// the last voltage reading in place.
    pub fn update(&mut self, status: DeviceStatus, rng: &mut StdRng) -> Option<Reading> {
        if status != DeviceStatus::Running {
            return None;
        }

        let temp_diff = (self.current_temp - self.target_temp).abs();
        self.compressor_speed = (temp_diff * 20.0).min(100.0);

        let current = 5.0 + (self.compressor_speed / 100.0) * 15.0 + gaussian_noise(rng, 0.3);
        let voltage = line_voltage(rng, 2.0);

        self.drift_toward_target();
        Some(Reading::new(voltage, current))
    }

    fn drift_toward_target(&mut self) {
        let gap = self.target_temp - self.current_temp;
        if gap.abs() <= DRIFT_PER_TICK {
            self.current_temp = self.target_temp;
        } else {
            self.current_temp += DRIFT_PER_TICK.copysign(gap);
        }
    }
}
