// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod cycle;
pub mod error;
pub mod ingest;
pub mod item;
pub mod notify;
pub mod scheduler;
pub mod store;
pub mod telemetry;
pub mod threshold;
pub mod window;

// ---- Re-exports for stable public API ----
pub use crate::config::Config;
pub use crate::cycle::{CycleReport, CycleSettings, Orchestrator};
pub use crate::error::{CycleError, StoreError};
pub use crate::item::Item;
pub use crate::store::SnapshotStore;
pub use crate::threshold::{band, worthy};
pub use crate::window::windowed;

use std::sync::Arc;

use crate::ingest::listing::ListingSource;
use crate::ingest::share_count::HttpShareCounter;
use crate::ingest::ItemSource;
use crate::notify::{LogNotifier, Notifier, Outbox, WebhookNotifier};

/// Everything the binary runs, wired from one [`Config`].
pub struct Service {
    pub orchestrator: Arc<Orchestrator>,
    pub outbox: Outbox,
    pub notifier: Arc<dyn Notifier>,
    pub view: api::ViewState,
}

impl Service {
    pub fn wire(cfg: &Config, source: Arc<dyn ItemSource>) -> Self {
        let store = SnapshotStore::new(&cfg.data_path);
        let outbox = Outbox::bounded(cfg.notify.queue_capacity);
        let orchestrator = Arc::new(Orchestrator::new(
            source,
            store.clone(),
            outbox.clone(),
            CycleSettings::from(cfg),
        ));
        Self {
            orchestrator,
            outbox,
            notifier: notifier_for(cfg),
            view: api::ViewState {
                store,
                verb: cfg.verb.clone(),
            },
        }
    }
}

/// Listing scraper plus HTTP share counter, as configured.
pub fn listing_source(cfg: &Config) -> anyhow::Result<Arc<dyn ItemSource>> {
    let counter = HttpShareCounter::new(&cfg.source.count_api).with_timeout(cfg.source.timeout_secs);
    Ok(Arc::new(ListingSource::from_url(
        &cfg.source.base_url,
        cfg.source.pages,
        Arc::new(counter),
        cfg.zone()?,
    )))
}

/// Dry run, or no webhook configured, means log-only delivery.
pub fn notifier_for(cfg: &Config) -> Arc<dyn Notifier> {
    match (&cfg.notify.webhook_url, cfg.dry_run) {
        (Some(url), false) => {
            Arc::new(WebhookNotifier::new(url).with_timeout(cfg.notify.timeout_secs))
        }
        (None, false) => {
            tracing::warn!("no webhook_url configured, notifications will only be logged");
            Arc::new(LogNotifier)
        }
        (_, true) => Arc::new(LogNotifier),
    }
}
