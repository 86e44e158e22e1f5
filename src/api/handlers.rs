//! Request handlers for the API endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use indexmap::IndexMap;

use crate::devices::Telemetry;
use crate::error::SimError;
use crate::sim::command::{CommandOutcome, CommandParams};
use crate::sim::engine::{CombinedSnapshot, InternalSnapshot};
use crate::sim::grid::GridContext;

use super::AppState;
use super::types::{ApiError, DeviceResponse, DevicesResponse, HealthResponse};

/// `GET /health` → 200 + `HealthResponse`
pub async fn health(State(engine): State<AppState>) -> Json<HealthResponse> {
    let status = engine.status();
    Json(HealthResponse {
        status: "ok",
        devices: engine.registry().len(),
        tick_running: status.devices_running,
        grid_running: status.grid_running,
    })
}

/// `GET /api/devices` → 200 + `DevicesResponse`
pub async fn list_devices(State(engine): State<AppState>) -> Json<DevicesResponse> {
    let devices = engine.list_devices();
    Json(DevicesResponse {
        device_count: devices.len(),
        devices,
    })
}

/// Latest telemetry of every device, keyed by id in registration order.
///
/// Served at `/api/devices/telemetry` and `/api/live`.
pub async fn all_telemetry(State(engine): State<AppState>) -> Json<IndexMap<String, Telemetry>> {
    Json(engine.get_all_telemetry())
}

/// `GET /api/devices/{id}` → 200 + `DeviceResponse`, or 404
pub async fn get_device(
    State(engine): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let device = engine
        .get_device(&id)
        .ok_or(SimError::NotFound(id))?;
    Ok(Json(DeviceResponse {
        telemetry: device.telemetry(),
        detail: device.detail(),
    }))
}

/// `POST /api/devices/{id}/control/{command}?level=N`
///
/// 200 + `CommandOutcome`; 404 unknown device, 409 rejected transition,
/// 400 unknown command or bad level.
pub async fn control_device(
    State(engine): State<AppState>,
    Path((id, command)): Path<(String, String)>,
    Query(params): Query<CommandParams>,
) -> Result<Json<CommandOutcome>, ApiError> {
    let outcome = engine.issue_command(&id, &command, &params)?;
    Ok(Json(outcome))
}

/// Current grid context. Served at `/api/grid-context` and `/api/streams/external`.
pub async fn grid_context(State(engine): State<AppState>) -> Json<GridContext> {
    Json(engine.get_grid_context())
}

/// `GET /api/streams/internal` → `{ devices, timestamp }`
pub async fn internal_stream(State(engine): State<AppState>) -> Json<InternalSnapshot> {
    Json(engine.internal())
}

/// `GET /api/streams/combined` → both streams with one timestamp
pub async fn combined_stream(State(engine): State<AppState>) -> Json<CombinedSnapshot> {
    Json(engine.combined())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::api::router;
    use crate::config::EngineConfig;
    use crate::sim::clock::ManualClock;
    use crate::sim::engine::SimulationEngine;

    use super::*;

    fn make_test_state() -> AppState {
        let engine = SimulationEngine::with_clock(
            &EngineConfig::seeded(42),
            Arc::new(ManualClock::new(1_000.0, 12)),
        )
        .unwrap();
        engine.registry().tick();
        Arc::new(engine)
    }

    async fn send(state: AppState, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = router(state).oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn devices_lists_four() {
        let (status, json) = send(make_test_state(), Method::GET, "/api/devices").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["device_count"], 4);
        assert_eq!(json["devices"][0]["device_id"], "motor_001");
        assert_eq!(json["devices"][0]["status"], "off");
    }

    #[tokio::test]
    async fn unknown_device_returns_404() {
        let (status, json) = send(make_test_state(), Method::GET, "/api/devices/pump_009").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn device_includes_detail() {
        let (status, json) = send(make_test_state(), Method::GET, "/api/devices/hvac_001").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["device_type"], "hvac");
        assert_eq!(json["detail"]["target_temp"], 22.0);
    }

    #[tokio::test]
    async fn start_on_hvac_returns_409() {
        let (status, _) = send(
            make_test_state(),
            Method::POST,
            "/api/devices/hvac_001/control/start",
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn brightness_out_of_range_returns_400() {
        let (status, _) = send(
            make_test_state(),
            Method::POST,
            "/api/devices/lighting_001/control/set_brightness?level=250",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn motor_start_reports_starting() {
        let state = make_test_state();
        let (status, json) = send(
            Arc::clone(&state),
            Method::POST,
            "/api/devices/motor_001/control/start",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "starting");

        let (_, live) = send(state, Method::GET, "/api/live").await;
        assert_eq!(live["motor_001"]["status"], "starting");
    }

    #[tokio::test]
    async fn internal_stream_wraps_devices_with_timestamp() {
        let (status, json) = send(make_test_state(), Method::GET, "/api/streams/internal").await;
        assert_eq!(status, StatusCode::OK);
        let devices = json["devices"].as_object().unwrap();
        assert_eq!(devices.len(), 4);
        assert_eq!(json["timestamp"], json["devices"]["motor_001"]["timestamp"]);
    }

    #[tokio::test]
    async fn health_reports_loops_stopped() {
        let (status, json) = send(make_test_state(), Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["devices"], 4);
        assert_eq!(json["tick_running"], false);
    }
}
