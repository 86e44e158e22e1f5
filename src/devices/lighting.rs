use rand::rngs::StdRng;

use crate::devices::types::{DeviceStatus, Reading, gaussian_noise, line_voltage};

/// Full-brightness current draw (A).
const MAX_CURRENT_AMPS: f64 = 2.5;

/// Dimmable lighting circuit; current is proportional to brightness.
#[derive(Debug, Clone)]
pub struct Lighting {
    /// Brightness level (0-100 %).
    brightness: f64,
}

impl Default for Lighting {
    fn default() -> Self {
        Self { brightness: 100.0 }
    }
}

impl Lighting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    /// Sets the brightness, clamped to 0-100 %. Returns the applied level.
    ///
    /// `level` must be finite; [`Device::set_brightness`](super::Device::set_brightness)
    /// rejects anything else before it gets here.
    pub fn set_brightness(&mut self, level: f64) -> f64 {
        self.brightness = level.clamp(0.0, 100.0);
        self.brightness
    }

    /// Advances the circuit by one tick. Returns `None` while off.
    pub fn update(&mut self, status: DeviceStatus, rng: &mut StdRng) -> Option<Reading> {
        if status != DeviceStatus::Running {
            return None;
        }

        let current = (self.brightness / 100.0) * MAX_CURRENT_AMPS + gaussian_noise(rng, 0.05);
        Some(Reading::new(line_voltage(rng, 1.0), current))
    }
}
