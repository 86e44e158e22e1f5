//! Device registry and the fixed-rate tick loop that drives it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::devices::{Device, DeviceDetail, DeviceStatus, DeviceType, Telemetry};
use crate::error::{SimError, UpdateError};

use super::clock::Clock;
use super::command::{Command, CommandOutcome};
use super::job::PeriodicJob;
use super::seed::SeedSource;

/// Default tick period of the device loop (10 Hz).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Devices every registry starts with, in tick order.
pub const DEFAULT_DEVICES: &[(&str, DeviceType)] = &[
    ("motor_001", DeviceType::Motor),
    ("hvac_001", DeviceType::Hvac),
    ("compressor_001", DeviceType::Compressor),
    ("lighting_001", DeviceType::Lighting),
];

/// Identity and status of a registered device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSummary {
    pub device_id: String,
    pub device_type: DeviceType,
    pub status: DeviceStatus,
}

/// A device plus its last published telemetry.
///
/// The device itself is only touched under its mutex; readers see the
/// published record, which is swapped wholesale after each update.
struct DeviceSlot {
    device_id: String,
    device_type: DeviceType,
    device: Mutex<Device>,
    published: RwLock<Telemetry>,
}

impl DeviceSlot {
    fn new(device: Device) -> Self {
        Self {
            device_id: device.id().to_string(),
            device_type: device.device_type(),
            published: RwLock::new(device.telemetry()),
            device: Mutex::new(device),
        }
    }

    fn tick(&self, now: f64) -> Result<(), UpdateError> {
        let mut device = self.device.lock();
        let telemetry = device.update(now)?;
        *self.published.write() = telemetry;
        Ok(())
    }

    fn telemetry(&self) -> Telemetry {
        self.published.read().clone()
    }
}

/// Command handle for one registered device.
///
/// Accepted commands republish the device's status immediately; the
/// measured fields change on the next tick.
#[derive(Clone)]
pub struct DeviceHandle {
    slot: Arc<DeviceSlot>,
}

impl DeviceHandle {
    pub fn id(&self) -> &str {
        &self.slot.device_id
    }

    pub fn device_type(&self) -> DeviceType {
        self.slot.device_type
    }

    /// Last published telemetry.
    pub fn telemetry(&self) -> Telemetry {
        self.slot.telemetry()
    }

    pub fn detail(&self) -> DeviceDetail {
        self.slot.device.lock().detail()
    }

    /// Applies a command to the device.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidTransition` if the device rejects it.
    pub fn apply(&self, command: Command) -> Result<CommandOutcome, SimError> {
        let mut device = self.slot.device.lock();
        let outcome = device.apply(command)?;
        self.slot.published.write().status = device.status();
        debug!(
            device_id = %self.slot.device_id,
            command = command.name(),
            status = %outcome.status,
            "command applied"
        );
        Ok(outcome)
    }

    pub fn turn_on(&self) -> Result<CommandOutcome, SimError> {
        self.apply(Command::TurnOn)
    }

    pub fn turn_off(&self) -> Result<CommandOutcome, SimError> {
        self.apply(Command::TurnOff)
    }

    pub fn start(&self) -> Result<CommandOutcome, SimError> {
        self.apply(Command::Start)
    }

    pub fn inject_fault(&self) -> Result<CommandOutcome, SimError> {
        self.apply(Command::InjectFault)
    }

    pub fn set_brightness(&self, level: f64) -> Result<CommandOutcome, SimError> {
        self.apply(Command::SetBrightness(level))
    }
}

struct RegistryState {
    devices: RwLock<IndexMap<String, Arc<DeviceSlot>>>,
    clock: Arc<dyn Clock>,
    ticks: AtomicU64,
}

impl RegistryState {
    fn tick(&self) {
        let slots: Vec<Arc<DeviceSlot>> = self.devices.read().values().cloned().collect();
        let now = self.clock.unix_time();
        for slot in slots {
            if let Err(err) = slot.tick(now) {
                warn!(device_id = %slot.device_id, error = %err, "update failed, keeping last telemetry");
            }
        }
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }
}

/// Owns the device collection and the loop that updates it.
///
/// Devices are updated in registration order. All reads return copies of
/// published telemetry and never block on a device's update step.
pub struct DeviceRegistry {
    state: Arc<RegistryState>,
    seeds: SeedSource,
    job: PeriodicJob,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    ///
    /// # Arguments
    ///
    /// * `clock` - Time source for device timestamps
    /// * `tick_interval` - Period of the update loop (must be non-zero)
    /// * `seeds` - Random source for devices created by the registry
    pub fn new(clock: Arc<dyn Clock>, tick_interval: Duration, seeds: SeedSource) -> Self {
        Self {
            state: Arc::new(RegistryState {
                devices: RwLock::new(IndexMap::new()),
                clock,
                ticks: AtomicU64::new(0),
            }),
            seeds,
            job: PeriodicJob::new("device-tick", tick_interval),
        }
    }

    /// Creates a registry holding the four default devices.
    pub fn with_default_devices(
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
        seeds: SeedSource,
    ) -> Self {
        let registry = Self::new(clock, tick_interval, seeds);
        for (id, device_type) in DEFAULT_DEVICES {
            // ids are distinct constants
            let _ = registry.register(id, *device_type);
        }
        registry
    }

    /// Registers a prebuilt device.
    ///
    /// # Errors
    ///
    /// Returns `SimError::DuplicateDevice` if the id is taken.
    pub fn add_device(&self, device: Device) -> Result<DeviceHandle, SimError> {
        let mut devices = self.state.devices.write();
        if devices.contains_key(device.id()) {
            return Err(SimError::DuplicateDevice(device.id().to_string()));
        }

        let slot = Arc::new(DeviceSlot::new(device));
        devices.insert(slot.device_id.clone(), Arc::clone(&slot));
        debug!(device_id = %slot.device_id, device_type = %slot.device_type, "device registered");
        Ok(DeviceHandle { slot })
    }

    /// Creates and registers a device of the given type with default state.
    ///
    /// # Errors
    ///
    /// Returns `SimError::DuplicateDevice` if the id is taken.
    pub fn register(&self, id: &str, device_type: DeviceType) -> Result<DeviceHandle, SimError> {
        let device = Device::with_type(
            id,
            device_type,
            self.seeds.next_rng(),
            self.state.clock.unix_time(),
        );
        self.add_device(device)
    }

    pub fn len(&self) -> usize {
        self.state.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of completed ticks since construction.
    pub fn tick_count(&self) -> u64 {
        self.state.ticks.load(Ordering::Relaxed)
    }

    pub fn tick_interval(&self) -> Duration {
        self.job.period()
    }

    pub fn get_device(&self, id: &str) -> Option<DeviceHandle> {
        self.state
            .devices
            .read()
            .get(id)
            .map(|slot| DeviceHandle {
                slot: Arc::clone(slot),
            })
    }

    /// Returns one device's telemetry.
    ///
    /// # Errors
    ///
    /// Returns `SimError::NotFound` for an unknown id.
    pub fn get_device_telemetry(&self, id: &str) -> Result<Telemetry, SimError> {
        self.state
            .devices
            .read()
            .get(id)
            .map(|slot| slot.telemetry())
            .ok_or_else(|| SimError::NotFound(id.to_string()))
    }

    /// Copies of all published telemetry, keyed by device id in tick order.
    pub fn get_all_telemetry(&self) -> IndexMap<String, Telemetry> {
        self.state
            .devices
            .read()
            .iter()
            .map(|(id, slot)| (id.clone(), slot.telemetry()))
            .collect()
    }

    pub fn list_devices(&self) -> Vec<DeviceSummary> {
        self.state
            .devices
            .read()
            .values()
            .map(|slot| {
                let t = slot.telemetry();
                DeviceSummary {
                    device_id: t.device_id,
                    device_type: t.device_type,
                    status: t.status,
                }
            })
            .collect()
    }

    /// Runs one tick synchronously: every device is updated once.
    ///
    /// A device whose update fails keeps its last telemetry; the others
    /// are unaffected.
    pub fn tick(&self) {
        self.state.tick();
    }

    /// Starts the tick loop. Returns `false` if it was already running.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&self) -> bool {
        let state = Arc::clone(&self.state);
        let started = self.job.start(move || state.tick());
        if started {
            info!(devices = self.len(), "device simulation started");
        }
        started
    }

    /// Stops the tick loop and waits for the in-flight tick to finish.
    ///
    /// No device telemetry changes through the loop after this returns.
    pub async fn stop(&self) -> bool {
        self.job.stop().await
    }

    pub fn is_running(&self) -> bool {
        self.job.is_running()
    }
}
