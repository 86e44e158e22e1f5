//! Device commands and their parsed, validated form.

use serde::{Deserialize, Serialize};

use crate::devices::DeviceStatus;
use crate::error::SimError;

/// A validated command for a single device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    TurnOn,
    TurnOff,
    Start,
    InjectFault,
    /// Brightness level in percent, already checked to lie in `[0, 100]`.
    SetBrightness(f64),
}

/// Optional parameters accompanying a command request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandParams {
    /// Brightness level for `set_brightness` (0-100).
    pub level: Option<f64>,
}

impl CommandParams {
    pub fn with_level(level: f64) -> Self {
        Self { level: Some(level) }
    }
}

impl Command {
    /// Command names accepted by [`Command::parse`].
    pub const NAMES: &[&str] = &["turn_on", "turn_off", "start", "inject_fault", "set_brightness"];

    /// Parses a command name and its parameters.
    ///
    /// Both `snake_case` and `kebab-case` names are accepted, along with the
    /// `on`/`off`/`brightness` shorthands used by control routes.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Validation` for an unknown command name or for a
    /// missing, non-finite, or out-of-range brightness level.
    pub fn parse(name: &str, params: &CommandParams) -> Result<Self, SimError> {
        match name.replace('-', "_").as_str() {
            "turn_on" | "on" => Ok(Self::TurnOn),
            "turn_off" | "off" => Ok(Self::TurnOff),
            "start" => Ok(Self::Start),
            "inject_fault" => Ok(Self::InjectFault),
            "set_brightness" | "brightness" => {
                let level = params
                    .level
                    .ok_or_else(|| SimError::validation("level", "is required"))?;
                if !level.is_finite() || !(0.0..=100.0).contains(&level) {
                    return Err(SimError::validation(
                        "level",
                        format!("must be between 0 and 100, got {level}"),
                    ));
                }
                Ok(Self::SetBrightness(level))
            }
            other => Err(SimError::validation(
                "command",
                format!(
                    "unknown command \"{other}\", available: {}",
                    Self::NAMES.join(", ")
                ),
            )),
        }
    }

    /// Canonical command name.
    pub fn name(self) -> &'static str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
            Self::Start => "start",
            Self::InjectFault => "inject_fault",
            Self::SetBrightness(_) => "set_brightness",
        }
    }
}

/// Result of an accepted command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutcome {
    pub device_id: String,
    /// Human-readable summary.
    pub message: String,
    /// Device status after the command.
    pub status: DeviceStatus,
    /// Device status before the command, when it could have changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<DeviceStatus>,
    /// Applied brightness for lighting commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
}
