//! Error taxonomy for device commands and per-tick updates.

use thiserror::Error;

use crate::devices::{DeviceStatus, DeviceType};

/// Errors reported to callers of the engine. None of them mutate state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// The referenced device id is not registered.
    #[error("device {0} not found")]
    NotFound(String),

    /// The command is not valid for the device's type or current state.
    #[error("cannot {command} {device_type} device {device_id} while {current}")]
    InvalidTransition {
        device_id: String,
        device_type: DeviceType,
        command: &'static str,
        current: DeviceStatus,
    },

    /// A command parameter is missing or malformed.
    #[error("invalid parameter `{param}`: {message}")]
    Validation { param: String, message: String },

    /// A device with the same id is already registered.
    #[error("device {0} is already registered")]
    DuplicateDevice(String),
}

impl SimError {
    pub(crate) fn validation(param: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            param: param.to_string(),
            message: message.into(),
        }
    }
}

/// Failure of a single device update step.
///
/// The registry logs it and keeps the device's previous telemetry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpdateError {
    #[error("device {device_id} produced a non-finite {field} ({value})")]
    NonFinite {
        device_id: String,
        field: &'static str,
        value: f64,
    },
}
