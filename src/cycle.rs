//! # Cycle Orchestrator
//! One polling pass: fetch → window → diff against the stored baseline →
//! notify → persist the fresh sample as the new baseline.
//!
//! A fetch or store failure aborts the pass before anything is persisted or
//! enqueued, so the next pass diffs against the untouched baseline and no
//! crossing is lost.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::{CycleError, CycleResult};
use crate::ingest::ItemSource;
use crate::item::Item;
use crate::notify::{format_message, Outbox};
use crate::store::{dedup_by_url, metric_index, SnapshotStore};
use crate::threshold::ThresholdPolicy;
use crate::window::windowed;

/// Per-cycle knobs, taken from [`Config`] at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSettings {
    pub days: u32,
    pub verb: String,
    pub threshold: ThresholdPolicy,
}

impl From<&Config> for CycleSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            days: cfg.days,
            verb: cfg.verb.clone(),
            threshold: cfg.threshold,
        }
    }
}

/// Outcome of a successful cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Items returned by the source, before windowing.
    pub fetched: usize,
    /// Fresh items inside the recency window.
    pub current: usize,
    /// Baseline items inside the recency window.
    pub previous: usize,
    /// Messages handed to the outbox, in evaluation order.
    pub notifications: Vec<String>,
    /// Rows written to the store.
    pub saved: usize,
}

pub struct Orchestrator {
    source: Arc<dyn ItemSource>,
    store: SnapshotStore,
    outbox: Outbox,
    settings: CycleSettings,
    running: Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn ItemSource>,
        store: SnapshotStore,
        outbox: Outbox,
        settings: CycleSettings,
    ) -> Self {
        Self {
            source,
            store,
            outbox,
            settings,
            running: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    pub async fn run_cycle(&self) -> CycleResult<CycleReport> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one cycle as of `now`. Returns [`CycleError::Busy`] instead of
    /// overlapping a cycle that is still in flight.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> CycleResult<CycleReport> {
        let _running = self.running.try_lock().map_err(|_| CycleError::Busy)?;
        let t0 = std::time::Instant::now();

        let result = self.cycle(now).await;

        histogram!("cycle_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        match &result {
            Ok(r) => {
                counter!("cycles_total").increment(1);
                tracing::info!(
                    target: "cycle",
                    source = self.source.name(),
                    fetched = r.fetched,
                    current = r.current,
                    previous = r.previous,
                    notified = r.notifications.len(),
                    saved = r.saved,
                    "cycle finished"
                );
            }
            Err(e) => {
                counter!("cycle_errors_total").increment(1);
                tracing::error!(target: "cycle", source = self.source.name(), "cycle aborted: {e}");
            }
        }
        result
    }

    async fn cycle(&self, now: DateTime<Utc>) -> CycleResult<CycleReport> {
        let raw = self.source.fetch().await.map_err(CycleError::Fetch)?;
        let fresh = dedup_by_url(&raw);
        let baseline = self.store.load_or_empty().await?;

        let current = windowed(&fresh, self.settings.days, &now);
        let previous = windowed(&baseline, self.settings.days, &now);

        let notifications = self.crossings(&current, &previous);

        let saved = self.store.save(&fresh).await?;

        for msg in &notifications {
            self.outbox.push(msg.clone());
        }

        Ok(CycleReport {
            fetched: raw.len(),
            current: current.len(),
            previous: previous.len(),
            notifications,
            saved,
        })
    }

    /// Messages for every current item that advanced a band since the baseline.
    fn crossings(&self, current: &[Item], previous: &[Item]) -> Vec<String> {
        let before = metric_index(previous);
        current
            .iter()
            .filter(|it| {
                let prev = before.get(it.url.as_str()).copied().unwrap_or(0);
                let hit = self.settings.threshold.is_worthy(it.metric, prev);
                if hit {
                    tracing::debug!(target: "cycle", url = %it.url, prev, cur = it.metric, "band crossed");
                }
                hit
            })
            .map(|it| format_message(it, &self.settings.verb))
            .collect()
    }
}
