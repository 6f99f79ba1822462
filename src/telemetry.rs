use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// Filter comes from `RUST_LOG` (default `info,hyper=warn,reqwest=warn`);
/// `LOG_FORMAT=json` switches to JSON lines, anything else is compact text.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder and describe our series.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("cycles_total", "Polling cycles that completed.");
    describe_counter!("cycle_errors_total", "Polling cycles aborted by a fetch or store error.");
    describe_histogram!("cycle_duration_ms", "Wall time of one polling cycle in milliseconds.");
    describe_gauge!("snapshot_items", "Rows in the last saved snapshot.");
    describe_counter!("ingest_items_total", "Articles returned by the listing source.");
    describe_histogram!("ingest_parse_ms", "Listing parse time in milliseconds.");
    describe_counter!("share_count_lookups_total", "Successful share-count lookups.");
    describe_counter!("share_count_errors_total", "Share-count lookups that failed, aborting the fetch.");
    describe_counter!("notifications_enqueued_total", "Messages pushed to the outbox.");
    describe_counter!("notifications_dropped_total", "Messages evicted from a full outbox.");
    describe_counter!("notifications_sent_total", "Messages delivered.");
    describe_counter!("notifications_failed_total", "Messages whose delivery failed.");
}
