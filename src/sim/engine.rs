//! Simulation engine that owns the device registry and the grid context model.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::config::{ConfigError, EngineConfig};
use crate::devices::Telemetry;
use crate::error::SimError;

use super::clock::{Clock, SystemClock};
use super::command::{Command, CommandOutcome, CommandParams};
use super::grid::{GridContext, GridContextModel};
use super::registry::{DeviceHandle, DeviceRegistry, DeviceSummary};
use super::seed::SeedSource;

/// Seed offset for the grid model so it never shares a stream with a device.
const GRID_SEED_OFFSET: u64 = 1_000_003;

/// Both streams in one response.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedSnapshot {
    /// Device telemetry keyed by id.
    pub internal_stream: IndexMap<String, Telemetry>,
    /// Grid context.
    pub external_stream: GridContext,
    /// Timestamp of the first device, or 0 with no devices.
    pub timestamp: f64,
}

/// Device telemetry with the first device's timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct InternalSnapshot {
    pub devices: IndexMap<String, Telemetry>,
    /// Timestamp of the first device, or 0 with no devices.
    pub timestamp: f64,
}

/// Running state of both periodic activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub devices_running: bool,
    pub grid_running: bool,
}

/// Composition root for the simulation.
///
/// The device loop and grid regeneration run as two independent periodic
/// jobs that share no state.
pub struct SimulationEngine {
    registry: DeviceRegistry,
    grid: GridContextModel,
}

impl SimulationEngine {
    /// Creates an engine with the default devices and the system clock.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` reported by [`EngineConfig::validate`].
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an engine with the default devices and the given clock.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` reported by [`EngineConfig::validate`];
    /// a zero period would otherwise stall the loops on `start`.
    pub fn with_clock(config: &EngineConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        if let Some(err) = config.validate().into_iter().next() {
            return Err(err);
        }
        let seed = config.simulation.seed;
        let registry = DeviceRegistry::with_default_devices(
            Arc::clone(&clock),
            Duration::from_millis(config.simulation.tick_interval_ms),
            SeedSource::new(seed),
        );
        let grid = GridContextModel::new(
            clock,
            Duration::from_secs(config.grid.update_interval_secs),
            &SeedSource::new(seed.map(|s| s.wrapping_add(GRID_SEED_OFFSET))),
        );
        Ok(Self { registry, grid })
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn grid(&self) -> &GridContextModel {
        &self.grid
    }

    pub fn list_devices(&self) -> Vec<DeviceSummary> {
        self.registry.list_devices()
    }

    /// Returns one device's telemetry.
    ///
    /// # Errors
    ///
    /// Returns `SimError::NotFound` for an unknown id.
    pub fn get_telemetry(&self, id: &str) -> Result<Telemetry, SimError> {
        self.registry.get_device_telemetry(id)
    }

    pub fn get_all_telemetry(&self) -> IndexMap<String, Telemetry> {
        self.registry.get_all_telemetry()
    }

    pub fn get_device(&self, id: &str) -> Option<DeviceHandle> {
        self.registry.get_device(id)
    }

    /// Parses and applies a named command to a device.
    ///
    /// # Errors
    ///
    /// - `SimError::NotFound` for an unknown device id
    /// - `SimError::Validation` for an unknown command or bad parameters
    /// - `SimError::InvalidTransition` if the device rejects the command
    pub fn issue_command(
        &self,
        id: &str,
        command: &str,
        params: &CommandParams,
    ) -> Result<CommandOutcome, SimError> {
        let device = self
            .registry
            .get_device(id)
            .ok_or_else(|| SimError::NotFound(id.to_string()))?;
        let command = Command::parse(command, params)?;
        device.apply(command)
    }

    pub fn get_grid_context(&self) -> GridContext {
        self.grid.get_context()
    }

    pub fn internal(&self) -> InternalSnapshot {
        let devices = self.get_all_telemetry();
        let timestamp = devices.values().next().map_or(0.0, |t| t.timestamp);
        InternalSnapshot { devices, timestamp }
    }

    pub fn combined(&self) -> CombinedSnapshot {
        let InternalSnapshot { devices, timestamp } = self.internal();
        CombinedSnapshot {
            internal_stream: devices,
            external_stream: self.get_grid_context(),
            timestamp,
        }
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            devices_running: self.registry.is_running(),
            grid_running: self.grid.is_running(),
        }
    }

    /// Starts both periodic activities; already-running ones are left alone.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&self) {
        self.registry.start();
        self.grid.start();
        info!(
            devices = self.registry.len(),
            tick_ms = self.registry.tick_interval().as_millis() as u64,
            grid_interval_secs = self.grid.update_interval().as_secs(),
            "simulation engine running"
        );
    }

    /// Stops both activities and waits for in-flight iterations to drain.
    pub async fn stop(&self) {
        self.registry.stop().await;
        self.grid.stop().await;
        info!("simulation engine stopped");
    }
}
