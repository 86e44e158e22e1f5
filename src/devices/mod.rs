//! Device simulators for industrial electrical loads.
//!
//! Every device is a single [`Device`] record tagged by its [`DeviceKind`];
//! `update` and the command operations dispatch on the kind, so the four
//! load types share one telemetry contract without trait objects.

/// Industrial air compressor model.
pub mod compressor;
/// HVAC unit model.
pub mod hvac;
/// Dimmable lighting model.
pub mod lighting;
/// Induction motor with inrush and locked-rotor behavior.
pub mod motor;
pub mod types;

use rand::rngs::StdRng;
use serde::Serialize;

pub use compressor::Compressor;
pub use hvac::Hvac;
pub use lighting::Lighting;
pub use motor::Motor;
pub use types::{DeviceStatus, DeviceType, NOMINAL_VOLTAGE, Reading, Telemetry};

use crate::error::{SimError, UpdateError};
use crate::sim::command::{Command, CommandOutcome};

/// Type-specific internal state of a device.
#[derive(Debug, Clone)]
pub enum DeviceKind {
    Motor(Motor),
    Hvac(Hvac),
    Compressor(Compressor),
    Lighting(Lighting),
}

impl DeviceKind {
    /// Fresh default state for the given device type.
    pub fn for_type(device_type: DeviceType) -> Self {
        match device_type {
            DeviceType::Motor => Self::Motor(Motor::new()),
            DeviceType::Hvac => Self::Hvac(Hvac::new()),
            DeviceType::Compressor => Self::Compressor(Compressor::new()),
            DeviceType::Lighting => Self::Lighting(Lighting::new()),
        }
    }

    pub fn device_type(&self) -> DeviceType {
        match self {
            Self::Motor(_) => DeviceType::Motor,
            Self::Hvac(_) => DeviceType::Hvac,
            Self::Compressor(_) => DeviceType::Compressor,
            Self::Lighting(_) => DeviceType::Lighting,
        }
    }
}

/// Type-specific internal state exposed for inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "device_type", rename_all = "lowercase")]
pub enum DeviceDetail {
    Motor {
        startup_elapsed: f64,
    },
    Hvac {
        target_temp: f64,
        current_temp: f64,
        compressor_speed: f64,
    },
    Compressor {
        pressure: f64,
        target_pressure: f64,
    },
    Lighting {
        brightness: f64,
    },
}

/// One simulated load: identity, measured fields, and kind-specific state.
///
/// Measured fields change only through [`Device::update`]; commands change
/// the status and kind-specific setpoints.
#[derive(Debug, Clone)]
pub struct Device {
    id: String,
    status: DeviceStatus,
    voltage: f64,
    current: f64,
    power: f64,
    timestamp: f64,
    kind: DeviceKind,
    rng: StdRng,
}

impl Device {
    /// Creates a device in the `off` state.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique device identifier
    /// * `kind` - Type-specific initial state
    /// * `rng` - Random source for all of this device's jitter
    /// * `timestamp` - Creation time in Unix seconds
    pub fn new(id: impl Into<String>, kind: DeviceKind, rng: StdRng, timestamp: f64) -> Self {
        Self {
            id: id.into(),
            status: DeviceStatus::Off,
            voltage: NOMINAL_VOLTAGE,
            current: 0.0,
            power: 0.0,
            timestamp,
            kind,
            rng,
        }
    }

    /// Creates a device of the given type with default internal state.
    pub fn with_type(
        id: impl Into<String>,
        device_type: DeviceType,
        rng: StdRng,
        timestamp: f64,
    ) -> Self {
        Self::new(id, DeviceKind::for_type(device_type), rng, timestamp)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn device_type(&self) -> DeviceType {
        self.kind.device_type()
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    /// Immutable copy of the current measured fields.
    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            device_id: self.id.clone(),
            device_type: self.device_type(),
            status: self.status,
            voltage: self.voltage,
            current: self.current,
            power: self.power,
            timestamp: self.timestamp,
        }
    }

    pub fn detail(&self) -> DeviceDetail {
        match &self.kind {
            DeviceKind::Motor(m) => DeviceDetail::Motor {
                startup_elapsed: m.startup_elapsed(),
            },
            DeviceKind::Hvac(h) => DeviceDetail::Hvac {
                target_temp: h.target_temp,
                current_temp: h.current_temp,
                compressor_speed: h.compressor_speed,
            },
            DeviceKind::Compressor(c) => DeviceDetail::Compressor {
                pressure: c.pressure,
                target_pressure: c.target_pressure,
            },
            DeviceKind::Lighting(l) => DeviceDetail::Lighting {
                brightness: l.brightness(),
            },
        }
    }

    /// Advances the device by exactly one tick.
    ///
    /// The step is computed on a copy and committed only if every measured
    /// field is finite; on error the device is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an `UpdateError` if the step produced a non-finite reading.
    pub fn update(&mut self, timestamp: f64) -> Result<Telemetry, UpdateError> {
        let mut next = self.clone();
        next.advance(timestamp);
        next.check_finite()?;
        *self = next;
        Ok(self.telemetry())
    }

    fn advance(&mut self, timestamp: f64) {
        let reading = match &mut self.kind {
            DeviceKind::Motor(m) => Some(m.update(&mut self.status, &mut self.rng)),
            DeviceKind::Hvac(h) => h.update(self.status, &mut self.rng),
            DeviceKind::Compressor(c) => c.update(self.status, &mut self.rng),
            DeviceKind::Lighting(l) => l.update(self.status, &mut self.rng),
        };

        match reading {
            Some(r) => {
                self.voltage = r.voltage;
                self.current = r.current;
                self.power = r.power();
            }
            // idle loads keep their last line voltage
            None => {
                self.current = 0.0;
                self.power = 0.0;
            }
        }
        self.timestamp = timestamp;
    }

    fn check_finite(&self) -> Result<(), UpdateError> {
        for (field, value) in [
            ("voltage", self.voltage),
            ("current", self.current),
            ("power", self.power),
        ] {
            if !value.is_finite() {
                return Err(UpdateError::NonFinite {
                    device_id: self.id.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Applies a command, dispatching on the device kind.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidTransition` if the command does not apply
    /// to this kind or to its current status. Rejected commands change nothing.
    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome, SimError> {
        match command {
            Command::TurnOn => self.turn_on(),
            Command::TurnOff => Ok(self.turn_off()),
            Command::Start => self.start(),
            Command::InjectFault => self.inject_fault(),
            Command::SetBrightness(level) => self.set_brightness(level),
        }
    }

    /// Requests the running state. Motors route through [`Device::start`];
    /// the other kinds accept the request from any state.
    pub fn turn_on(&mut self) -> Result<CommandOutcome, SimError> {
        if matches!(self.kind, DeviceKind::Motor(_)) {
            return self.start_motor(Command::TurnOn);
        }
        let previous = self.status;
        self.status = DeviceStatus::Running;
        Ok(self.outcome(format!("Device {} turned on", self.id), Some(previous)))
    }

    /// Switches the device off from any state.
    pub fn turn_off(&mut self) -> CommandOutcome {
        let previous = self.status;
        self.status = DeviceStatus::Off;
        match &mut self.kind {
            DeviceKind::Motor(m) => m.reset_startup(),
            DeviceKind::Hvac(h) => h.shut_down(),
            DeviceKind::Compressor(_) | DeviceKind::Lighting(_) => {}
        }
        self.outcome(format!("Device {} turned off", self.id), Some(previous))
    }

    /// Starts a motor. Valid only for motors in the `off` state.
    pub fn start(&mut self) -> Result<CommandOutcome, SimError> {
        self.start_motor(Command::Start)
    }

    /// Shared by `start` and motor `turn_on`; a rejection names `requested`.
    fn start_motor(&mut self, requested: Command) -> Result<CommandOutcome, SimError> {
        if !matches!(self.kind, DeviceKind::Motor(_)) || self.status != DeviceStatus::Off {
            return Err(self.rejected(requested));
        }

        if let DeviceKind::Motor(motor) = &mut self.kind {
            motor.reset_startup();
        }
        self.status = DeviceStatus::Starting;
        Ok(self.outcome(
            "Motor starting - peak inrush 120A for 0.5s, then decay to 42.5A".to_string(),
            Some(DeviceStatus::Off),
        ))
    }

    /// Forces a motor into the locked-rotor fault from any state.
    pub fn inject_fault(&mut self) -> Result<CommandOutcome, SimError> {
        if !matches!(self.kind, DeviceKind::Motor(_)) {
            return Err(self.rejected(Command::InjectFault));
        }
        let previous = self.status;
        self.status = DeviceStatus::Fault;
        Ok(self.outcome("Locked rotor fault injected".to_string(), Some(previous)))
    }

    /// Sets lighting brightness, clamped to 0-100 %.
    ///
    /// # Errors
    ///
    /// - `SimError::InvalidTransition` for a non-lighting device
    /// - `SimError::Validation` for a non-finite level; nothing is changed
    pub fn set_brightness(&mut self, level: f64) -> Result<CommandOutcome, SimError> {
        if !matches!(self.kind, DeviceKind::Lighting(_)) {
            return Err(self.rejected(Command::SetBrightness(level)));
        }
        if !level.is_finite() {
            return Err(SimError::validation(
                "level",
                format!("must be a finite number, got {level}"),
            ));
        }
        let applied = match &mut self.kind {
            DeviceKind::Lighting(lighting) => lighting.set_brightness(level),
            _ => return Err(self.rejected(Command::SetBrightness(level))),
        };

        let mut outcome = self.outcome(format!("Brightness set to {applied}%"), None);
        outcome.brightness = Some(applied);
        Ok(outcome)
    }

    fn rejected(&self, command: Command) -> SimError {
        SimError::InvalidTransition {
            device_id: self.id.clone(),
            device_type: self.device_type(),
            command: command.name(),
            current: self.status,
        }
    }

    fn outcome(&self, message: String, previous_status: Option<DeviceStatus>) -> CommandOutcome {
        CommandOutcome {
            device_id: self.id.clone(),
            message,
            status: self.status,
            previous_status,
            brightness: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn device(device_type: DeviceType) -> Device {
        Device::with_type("dev", device_type, StdRng::seed_from_u64(11), 0.0)
    }

    fn assert_power_identity(t: &Telemetry) {
        let expected = t.voltage * t.current;
        let tol = 1e-6 * expected.abs().max(1.0);
        assert!((t.power - expected).abs() <= tol, "{t:?}");
    }

    #[test]
    fn new_device_is_off_and_idle() {
        let d = device(DeviceType::Compressor);
        let t = d.telemetry();
        assert_eq!(t.status, DeviceStatus::Off);
        assert_eq!(t.current, 0.0);
        assert_eq!(t.power, 0.0);
        assert_eq!(t.device_type, DeviceType::Compressor);
    }

    #[test]
    fn update_stamps_timestamp() {
        let mut d = device(DeviceType::Hvac);
        let t = d.update(42.5).unwrap();
        assert_eq!(t.timestamp, 42.5);
    }

    #[test]
    fn power_identity_holds_for_all_kinds() {
        for device_type in [
            DeviceType::Motor,
            DeviceType::Hvac,
            DeviceType::Compressor,
            DeviceType::Lighting,
        ] {
            let mut d = device(device_type);
            d.turn_on().unwrap();
            for tick in 0..80 {
                let t = d.update(f64::from(tick)).unwrap();
                assert_power_identity(&t);
            }
            d.turn_off();
            assert_power_identity(&d.update(100.0).unwrap());
        }
    }

    #[test]
    fn motor_turn_on_aliases_start() {
        let mut d = device(DeviceType::Motor);
        let outcome = d.turn_on().unwrap();
        assert_eq!(outcome.status, DeviceStatus::Starting);
        assert!(d.turn_on().is_err());
    }

    #[test]
    fn start_rejected_unless_off() {
        let mut d = device(DeviceType::Motor);
        d.inject_fault().unwrap();
        let err = d.start().unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidTransition {
                current: DeviceStatus::Fault,
                ..
            }
        ));
        assert_eq!(d.status(), DeviceStatus::Fault);
    }

    #[test]
    fn inject_fault_reports_previous_status() {
        let mut d = device(DeviceType::Motor);
        d.start().unwrap();
        let outcome = d.inject_fault().unwrap();
        assert_eq!(outcome.previous_status, Some(DeviceStatus::Starting));
        assert_eq!(outcome.status, DeviceStatus::Fault);
    }

    #[test]
    fn motor_only_commands_rejected_elsewhere() {
        let mut d = device(DeviceType::Hvac);
        assert!(d.start().is_err());
        assert!(d.inject_fault().is_err());
        assert_eq!(d.status(), DeviceStatus::Off);
    }

    #[test]
    fn brightness_only_for_lighting() {
        let mut motor = device(DeviceType::Motor);
        assert!(matches!(
            motor.set_brightness(50.0),
            Err(SimError::InvalidTransition {
                command: "set_brightness",
                ..
            })
        ));

        let mut light = device(DeviceType::Lighting);
        let outcome = light.set_brightness(40.0).unwrap();
        assert_eq!(outcome.brightness, Some(40.0));
        assert_eq!(light.detail(), DeviceDetail::Lighting { brightness: 40.0 });
    }

    #[test]
    fn turn_on_is_idempotent_for_simple_loads() {
        let mut d = device(DeviceType::Lighting);
        d.turn_on().unwrap();
        let outcome = d.turn_on().unwrap();
        assert_eq!(outcome.previous_status, Some(DeviceStatus::Running));
        assert_eq!(d.status(), DeviceStatus::Running);
    }

    #[test]
    fn hvac_turn_off_stops_compressor() {
        let mut d = device(DeviceType::Hvac);
        d.turn_on().unwrap();
        d.update(1.0).unwrap();
        d.turn_off();
        assert!(matches!(
            d.detail(),
            DeviceDetail::Hvac {
                compressor_speed,
                ..
            } if compressor_speed == 0.0
        ));
    }

    #[test]
    fn motor_off_zeroes_voltage() {
        let mut d = device(DeviceType::Motor);
        let t = d.update(1.0).unwrap();
        assert_eq!(t.voltage, 0.0);
        assert_eq!(t.power, 0.0);
    }

    #[test]
    fn non_finite_brightness_rejected_without_mutation() {
        let mut light = device(DeviceType::Lighting);
        light.turn_on().unwrap();
        for level in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = light.set_brightness(level).unwrap_err();
            assert!(matches!(err, SimError::Validation { .. }), "{level}");
        }
        assert_eq!(light.detail(), DeviceDetail::Lighting { brightness: 100.0 });
        assert!(light.update(1.0).is_ok());
    }

    #[test]
    fn motor_turn_on_rejection_names_turn_on() {
        let mut d = device(DeviceType::Motor);
        d.start().unwrap();
        let err = d.turn_on().unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidTransition {
                command: "turn_on",
                current: DeviceStatus::Starting,
                ..
            }
        ));
    }
}
