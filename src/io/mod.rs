/// CSV export of sampled device telemetry.
pub mod export;
