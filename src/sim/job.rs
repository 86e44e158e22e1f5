//! Cancellable fixed-period background job.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

struct RunningJob {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// A periodic activity running as a Tokio task.
///
/// The iteration closure is synchronous, so the task only yields at its
/// sleep boundary: cancellation never interrupts an iteration midway.
pub struct PeriodicJob {
    name: &'static str,
    period: Duration,
    running: Mutex<Option<RunningJob>>,
}

impl PeriodicJob {
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period,
            running: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Spawns the job. The first iteration runs immediately, then once
    /// per period; late ticks are delayed rather than bunched.
    ///
    /// Returns `false` without spawning anything if the job is already running.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start<F>(&self, mut iteration: F) -> bool
    where
        F: FnMut() + Send + 'static,
    {
        let mut running = self.running.lock();
        if running.is_some() {
            debug!(job = self.name, "already running");
            return false;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let period = self.period;
        let name = self.name;
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = interval.tick() => iteration(),
                }
            }
            debug!(job = name, "loop exited");
        });

        *running = Some(RunningJob { shutdown, task });
        info!(job = self.name, period_ms = period.as_millis() as u64, "started");
        true
    }

    /// Cancels the pending wait and waits for the task to finish.
    ///
    /// Once this returns the iteration closure will not run again.
    /// Returns `false` if the job was not running.
    pub async fn stop(&self) -> bool {
        let Some(job) = self.running.lock().take() else {
            return false;
        };

        let _ = job.shutdown.send(true);
        if let Err(err) = job.task.await {
            warn!(job = self.name, error = %err, "task ended abnormally");
        }
        info!(job = self.name, "stopped");
        true
    }
}

impl Drop for PeriodicJob {
    fn drop(&mut self) {
        if let Some(job) = self.running.get_mut().take() {
            let _ = job.shutdown.send(true);
        }
    }
}
