// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::cycle::{CycleReport, Orchestrator};

/// Drives the orchestrator: once eagerly, then every `period` until shutdown.
pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    period: Duration,
}

/// Sender half used to stop the scheduler. Dropping it also stops it.
pub type ShutdownTx = watch::Sender<bool>;
pub type ShutdownRx = watch::Receiver<bool>;

pub fn shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    watch::channel(false)
}

impl Scheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, period: Duration) -> Self {
        Self {
            orchestrator,
            period,
        }
    }

    /// Run the first cycle in the caller's task (so a baseline exists before
    /// anything reads the store), then spawn the periodic loop.
    pub async fn start(self, shutdown: ShutdownRx) -> (Option<CycleReport>, JoinHandle<()>) {
        let first = run_logged(&self.orchestrator).await;
        let handle = tokio::spawn(self.run_loop(shutdown));
        (first, handle)
    }

    /// Ticks never queue up: a slow cycle just pushes the next tick back.
    /// Shutdown is only observed between cycles, so an in-flight cycle
    /// always completes.
    async fn run_loop(self, mut shutdown: ShutdownRx) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    run_logged(&self.orchestrator).await;
                }
            }
        }
        tracing::info!(target: "scheduler", "scheduler stopped");
    }
}

async fn run_logged(orchestrator: &Orchestrator) -> Option<CycleReport> {
    // The orchestrator already logs and counts failures; the loop just moves on.
    orchestrator.run_cycle().await.ok()
}
