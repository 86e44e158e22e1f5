//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use gridsense_sim::config::EngineConfig;
use gridsense_sim::devices::Telemetry;
use gridsense_sim::sim::clock::ManualClock;
use gridsense_sim::sim::engine::SimulationEngine;
use gridsense_sim::sim::registry::DeviceHandle;

/// Seconds of wall time per tick at the default 10 Hz rate.
pub const TICK_SECS: f64 = 0.1;

/// Seeded engine on a manual clock starting at Unix time 1000, noon.
pub fn manual_engine(seed: u64) -> (Arc<ManualClock>, SimulationEngine) {
    let clock = Arc::new(ManualClock::new(1_000.0, 12));
    let engine = SimulationEngine::with_clock(&EngineConfig::seeded(seed), clock.clone())
        .unwrap_or_else(|e| panic!("seeded config should be valid: {e}"));
    (clock, engine)
}

/// Advances the clock one tick period and runs one tick.
pub fn step(clock: &ManualClock, engine: &SimulationEngine) {
    clock.advance(TICK_SECS);
    engine.registry().tick();
}

/// Runs `n` ticks and returns the given device's telemetry after each.
pub fn run_ticks(
    clock: &ManualClock,
    engine: &SimulationEngine,
    device: &DeviceHandle,
    n: usize,
) -> Vec<Telemetry> {
    (0..n)
        .map(|_| {
            step(clock, engine);
            device.telemetry()
        })
        .collect()
}

/// Looks up a default device; panics with the id if it is missing.
pub fn device(engine: &SimulationEngine, id: &str) -> DeviceHandle {
    engine
        .get_device(id)
        .unwrap_or_else(|| panic!("default device {id} should exist"))
}
