//! Slowly varying grid context: carbon intensity, price, and renewable share.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::devices::types::uniform;

use super::clock::Clock;
use super::job::PeriodicJob;
use super::seed::SeedSource;

/// Default regeneration period (15 minutes).
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(900);

/// Qualitative band of a grid signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Low,
    Medium,
    High,
}

/// Point-in-time view of the external grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridContext {
    /// Carbon intensity (gCO2/kWh).
    pub carbon_intensity: f64,
    pub carbon_level: Level,
    /// Electricity price ($/kWh).
    pub electricity_price: f64,
    pub pricing_tier: Level,
    /// Share of renewable generation (0-100 %).
    pub grid_renewable_percentage: f64,
    /// Time of the last regeneration in Unix seconds.
    pub last_updated: f64,
    /// Seconds until the next regeneration.
    pub next_update_in: u64,
}

impl GridContext {
    /// Neutral placeholder published before the first regeneration.
    pub fn neutral(now: f64) -> Self {
        Self {
            carbon_intensity: 0.0,
            carbon_level: Level::Medium,
            electricity_price: 0.0,
            pricing_tier: Level::Medium,
            grid_renewable_percentage: 0.0,
            last_updated: now,
            next_update_in: 0,
        }
    }
}

/// Carbon band for an hour of day: level, intensity range, renewable range.
fn carbon_band(hour: u32) -> (Level, (f64, f64), (f64, f64)) {
    match hour {
        // solar peak
        10..=15 => (Level::Low, (200.0, 350.0), (50.0, 70.0)),
        // evening fossil peak
        19..=22 => (Level::High, (600.0, 800.0), (10.0, 25.0)),
        _ => (Level::Medium, (400.0, 550.0), (30.0, 45.0)),
    }
}

/// Price band for an hour of day: tier and price range.
fn price_band(hour: u32) -> (Level, (f64, f64)) {
    match hour {
        17..=21 => (Level::High, (0.25, 0.35)),
        h if h >= 23 || h <= 6 => (Level::Low, (0.08, 0.12)),
        _ => (Level::Medium, (0.15, 0.22)),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Draws a fresh grid context for the given local hour.
///
/// # Arguments
///
/// * `hour` - Local hour of day (0-23)
/// * `rng` - Random source for the in-band draws
/// * `now` - Regeneration time in Unix seconds
/// * `update_interval` - Regeneration period, reported as `next_update_in`
pub fn sample_context(
    hour: u32,
    rng: &mut StdRng,
    now: f64,
    update_interval: Duration,
) -> GridContext {
    let (carbon_level, (c_lo, c_hi), (r_lo, r_hi)) = carbon_band(hour);
    let (pricing_tier, (p_lo, p_hi)) = price_band(hour);

    let carbon_intensity = round_to(uniform(rng, c_lo, c_hi), 2);
    let grid_renewable_percentage = round_to(uniform(rng, r_lo, r_hi), 2);
    let electricity_price = round_to(uniform(rng, p_lo, p_hi), 4);

    GridContext {
        carbon_intensity,
        carbon_level,
        electricity_price,
        pricing_tier,
        grid_renewable_percentage,
        last_updated: now,
        next_update_in: update_interval.as_secs(),
    }
}

struct GridState {
    context: RwLock<GridContext>,
    rng: Mutex<StdRng>,
    clock: Arc<dyn Clock>,
    update_interval: Duration,
}

impl GridState {
    fn regenerate(&self) -> GridContext {
        let hour = self.clock.local_hour();
        let now = self.clock.unix_time();
        let next = sample_context(hour, &mut self.rng.lock(), now, self.update_interval);
        *self.context.write() = next.clone();
        debug!(
            hour,
            carbon_level = ?next.carbon_level,
            pricing_tier = ?next.pricing_tier,
            "grid context regenerated"
        );
        next
    }
}

/// Publishes a grid context regenerated on a fixed period.
///
/// Reads return the last published value; nothing is sampled on read.
pub struct GridContextModel {
    state: Arc<GridState>,
    job: PeriodicJob,
}

impl GridContextModel {
    /// Creates a model holding the neutral context.
    pub fn new(clock: Arc<dyn Clock>, update_interval: Duration, seeds: &SeedSource) -> Self {
        let context = GridContext::neutral(clock.unix_time());
        Self {
            state: Arc::new(GridState {
                context: RwLock::new(context),
                rng: Mutex::new(seeds.next_rng()),
                clock,
                update_interval,
            }),
            job: PeriodicJob::new("grid-context", update_interval),
        }
    }

    pub fn update_interval(&self) -> Duration {
        self.state.update_interval
    }

    /// The last published context.
    pub fn get_context(&self) -> GridContext {
        self.state.context.read().clone()
    }

    /// Draws and publishes a new context from the current hour's bands.
    pub fn regenerate(&self) -> GridContext {
        self.state.regenerate()
    }

    /// Starts periodic regeneration, the first one immediately.
    /// Returns `false` if it was already running.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&self) -> bool {
        let state = Arc::clone(&self.state);
        let started = self.job.start(move || {
            state.regenerate();
        });
        if started {
            info!(
                interval_secs = self.state.update_interval.as_secs(),
                "grid context simulation started"
            );
        }
        started
    }

    /// Stops regeneration and waits for an in-flight one to finish.
    pub async fn stop(&self) -> bool {
        self.job.stop().await
    }

    pub fn is_running(&self) -> bool {
        self.job.is_running()
    }
}
