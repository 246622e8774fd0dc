use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use super::cycle::ExecutionEngine;
use crate::config::EngineConfig;
use crate::error::Result;

/// Drives the engine on a fixed cadence.
///
/// Holds an explicit lease around each cycle instead of an ambient "is
/// running" flag: a tick that finds the lease taken is skipped, so cycles
/// never pile up behind a slow one. `trigger_now` shares the same lease, so
/// on-demand and scheduled runs cannot overlap either.
pub struct Scheduler {
    engine: Arc<ExecutionEngine>,
    config: EngineConfig,
    lease: Arc<Mutex<()>>,
}

impl Scheduler {
    pub fn new(engine: Arc<ExecutionEngine>, config: EngineConfig) -> Self {
        Self {
            engine,
            config,
            lease: Arc::new(Mutex::new(())),
        }
    }

    /// Run cycles until the shutdown signal flips. The cycle in progress is
    /// allowed to drain; no new cycle starts afterwards.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut ticker = interval(self.config.cycle_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.cycle_interval_secs,
            "scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("scheduler shutting down");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Run a single cycle on demand, waiting for the lease
    pub async fn trigger_now(&self) -> Result<()> {
        let _lease = self.lease.lock().await;
        self.engine.run_cycle().await.map(|_| ())
    }

    async fn tick(&self) {
        // A previous cycle still holds the lease: skip this tick entirely
        // rather than queueing behind it.
        let Ok(_lease) = self.lease.try_lock() else {
            warn!("previous cycle still running, skipping tick");
            return;
        };

        if let Err(e) = self.engine.run_cycle().await {
            // Store-wide failures abort the cycle; the next tick retries.
            error!(error = %e, fatal = e.is_fatal(), "cycle aborted");
        }
    }
}
