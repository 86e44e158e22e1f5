//! TOML-based engine configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Top-level engine configuration parsed from TOML.
///
/// All fields have defaults matching the standard 10 Hz / 15 minute
/// setup. Load from TOML with [`EngineConfig::from_toml_file`] or use
/// [`EngineConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Device loop timing and randomness.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Grid context regeneration.
    #[serde(default)]
    pub grid: GridConfig,
    /// HTTP transport settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Device loop timing and randomness.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Tick period of the device loop in milliseconds (must be > 0).
    pub tick_interval_ms: u64,
    /// Master random seed; unseeded when absent.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            seed: None,
        }
    }
}

/// Grid context regeneration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Regeneration period in seconds (must be > 0).
    pub update_interval_secs: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: 900,
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen port (must be > 0).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.tick_interval_ms"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl EngineConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "demo"];

    /// Default configuration with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        let mut cfg = Self::default();
        cfg.simulation.seed = Some(seed);
        cfg
    }

    /// Demo preset: reproducible devices and a grid context that moves every minute.
    pub fn demo() -> Self {
        Self {
            simulation: SimulationConfig {
                seed: Some(42),
                ..SimulationConfig::default()
            },
            grid: GridConfig {
                update_interval_secs: 60,
            },
            server: ServerConfig::default(),
        }
    }

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "default" => Ok(Self::default()),
            "demo" => Ok(Self::demo()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.simulation.tick_interval_ms == 0 {
            errors.push(ConfigError {
                field: "simulation.tick_interval_ms".into(),
                message: "must be > 0".into(),
            });
        }
        if self.grid.update_interval_secs == 0 {
            errors.push(ConfigError {
                field: "grid.update_interval_secs".into(),
                message: "must be > 0".into(),
            });
        }
        if self.server.port == 0 {
            errors.push(ConfigError {
                field: "server.port".into(),
                message: "must be > 0".into(),
            });
        }

        errors
    }
}
