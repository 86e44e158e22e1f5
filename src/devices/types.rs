//! Common types shared by all device simulators.

use std::fmt;

use rand::{Rng, rngs::StdRng};
use serde::{Deserialize, Serialize};

/// Line voltage every device is nominally fed from (V).
pub const NOMINAL_VOLTAGE: f64 = 230.0;

/// Kind of electrical load a device simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Motor,
    Hvac,
    Compressor,
    Lighting,
}

impl DeviceType {
    /// Returns the lowercase wire name of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Motor => "motor",
            Self::Hvac => "hvac",
            Self::Compressor => "compressor",
            Self::Lighting => "lighting",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating state of a device.
///
/// Only motors pass through `Starting` and `Fault`; the other kinds
/// alternate between `Off` and `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Off,
    Starting,
    Running,
    Fault,
}

impl DeviceStatus {
    /// Returns the lowercase wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Fault => "fault",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable point-in-time telemetry record of one device.
///
/// `power` is always the product of the `voltage` and `current` recorded
/// in the same update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Unique device identifier.
    pub device_id: String,
    /// Kind of load.
    pub device_type: DeviceType,
    /// Operating state at the time of the sample.
    pub status: DeviceStatus,
    /// Line voltage (V).
    pub voltage: f64,
    /// Current draw (A).
    pub current: f64,
    /// Real power (W).
    pub power: f64,
    /// Sample time in Unix seconds.
    pub timestamp: f64,
}

/// Electrical reading produced by one device-specific update step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub voltage: f64,
    pub current: f64,
}

impl Reading {
    pub fn new(voltage: f64, current: f64) -> Self {
        Self { voltage, current }
    }

    /// Real power of the reading (W).
    pub fn power(&self) -> f64 {
        self.voltage * self.current
    }
}

/// Utility function to generate Gaussian noise using Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation of the noise
///
/// # Returns
///
/// Random value from a Gaussian distribution with mean 0 and specified standard deviation
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Draws a value uniformly from the closed interval `[low, high]`.
pub fn uniform(rng: &mut StdRng, low: f64, high: f64) -> f64 {
    rng.random_range(low..=high)
}

/// Nominal supply voltage with Gaussian jitter of the given spread.
pub fn line_voltage(rng: &mut StdRng, std_dev: f64) -> f64 {
    NOMINAL_VOLTAGE + gaussian_noise(rng, std_dev)
}

/// Rounds to two decimals, the precision of displayed current values.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn reading_power_is_product() {
        let r = Reading::new(231.5, 42.25);
        assert_eq!(r.power(), 231.5 * 42.25);
    }

    #[test]
    fn zero_std_dev_gives_no_noise() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(gaussian_noise(&mut rng, 0.0), 0.0);
        assert_eq!(line_voltage(&mut rng, 0.0), NOMINAL_VOLTAGE);
    }

    #[test]
    fn gaussian_noise_is_centered() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 10_000;
        let mean: f64 = (0..n).map(|_| gaussian_noise(&mut rng, 2.0)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.1, "mean drifted: {mean}");
    }

    #[test]
    fn uniform_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let v = uniform(&mut rng, 25.0, 30.0);
            assert!((25.0..=30.0).contains(&v));
        }
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(42.456), 42.46);
        assert_eq!(round2(120.0), 120.0);
    }

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(DeviceType::Hvac.to_string(), "hvac");
        assert_eq!(DeviceStatus::Starting.as_str(), "starting");
    }
}
