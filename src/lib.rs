//! Synthetic industrial telemetry simulator.
//!
//! Four device models (motor, HVAC, compressor, lighting) are advanced by a
//! 10 Hz tick loop while a separate grid context model publishes carbon,
//! price, and renewable signals on a slow period.

/// HTTP surface over the simulation engine.
#[cfg(feature = "api")]
pub mod api;
pub mod config;
/// Device state machines and telemetry types.
pub mod devices;
pub mod error;
pub mod io;
/// Registry, tick loop, grid context, and engine.
pub mod sim;
