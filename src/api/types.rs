//! API response types and error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::devices::{DeviceDetail, Telemetry};
use crate::error::SimError;
use crate::sim::registry::DeviceSummary;

/// `GET /api/devices` body.
#[derive(Debug, Serialize)]
pub struct DevicesResponse {
    pub device_count: usize,
    pub devices: Vec<DeviceSummary>,
}

/// `GET /api/devices/{id}` body: the published telemetry plus internal state.
#[derive(Debug, Serialize)]
pub struct DeviceResponse {
    #[serde(flatten)]
    pub telemetry: Telemetry,
    pub detail: DeviceDetail,
}

/// `GET /health` body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub devices: usize,
    pub tick_running: bool,
    pub grid_running: bool,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

/// Engine error carried to the HTTP boundary.
#[derive(Debug)]
pub struct ApiError(pub SimError);

impl From<SimError> for ApiError {
    fn from(e: SimError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            SimError::NotFound(_) => StatusCode::NOT_FOUND,
            SimError::InvalidTransition { .. } | SimError::DuplicateDevice(_) => {
                StatusCode::CONFLICT
            }
            SimError::Validation { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{DeviceStatus, DeviceType};

    #[test]
    fn error_kinds_map_to_status_codes() {
        let not_found = ApiError(SimError::NotFound("x".into()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let transition = ApiError(SimError::InvalidTransition {
            device_id: "hvac_001".into(),
            device_type: DeviceType::Hvac,
            command: "start",
            current: DeviceStatus::Off,
        });
        assert_eq!(transition.status(), StatusCode::CONFLICT);

        let validation = ApiError(SimError::validation("level", "missing"));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn device_response_flattens_telemetry() {
        let resp = DeviceResponse {
            telemetry: Telemetry {
                device_id: "lighting_001".into(),
                device_type: DeviceType::Lighting,
                status: DeviceStatus::Off,
                voltage: 230.0,
                current: 0.0,
                power: 0.0,
                timestamp: 0.0,
            },
            detail: DeviceDetail::Lighting { brightness: 100.0 },
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["device_id"], "lighting_001");
        assert_eq!(json["status"], "off");
        assert_eq!(json["detail"]["brightness"], 100.0);
    }
}
