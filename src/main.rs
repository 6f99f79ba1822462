//! share-watch binary entrypoint.
//!
//! Polls the article listing, notifies when an article's share count enters a
//! new band, and serves the stored snapshot over HTTP.
//!
//! ```bash
//! share-watch --days 5 --interval-secs 1200 --dry-run
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;

use share_watch::notify::spawn_sender;
use share_watch::scheduler::{shutdown_channel, Scheduler};
use share_watch::telemetry::{init_tracing, Metrics};
use share_watch::{api, listing_source, Config, Service};

/// Flags override the config file and `SHARE_WATCH_*` environment variables.
#[derive(Parser, Debug)]
#[command(name = "share-watch", version, about)]
struct Cli {
    /// Path to a TOML config file (default: $SHARE_WATCH_CONFIG or config/share_watch.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Days to look back.
    #[arg(short = 'd', long)]
    days: Option<u32>,

    /// Polling interval in seconds.
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Log notifications instead of sending them.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn resolve(&self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(p) => {
                let mut c = Config::load_from(p)?;
                c.apply_env();
                c
            }
            None => Config::load_default()?,
        };
        if let Some(d) = self.days {
            cfg.days = d;
        }
        if let Some(s) = self.interval_secs {
            cfg.interval_secs = s;
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Cli::parse().resolve()?;
    if cfg.dry_run {
        tracing::info!("running in dry-run mode");
    }

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!("metrics disabled: {e:#}");
            None
        }
    };

    let service = Service::wire(&cfg, listing_source(&cfg)?);
    let send_delay = Duration::from_secs(cfg.notify.send_delay_secs);
    let sender = spawn_sender(service.outbox.clone(), service.notifier.clone(), send_delay);

    // First cycle runs before the view is served so the snapshot exists.
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let scheduler = Scheduler::new(service.orchestrator.clone(), cfg.interval());
    let (first, scheduler_task) = scheduler.start(shutdown_rx).await;
    match first {
        Some(r) => tracing::info!(saved = r.saved, "initial snapshot stored"),
        None => tracing::warn!("initial cycle failed, view starts without a fresh snapshot"),
    }

    let mut app = api::router(service.view.clone());
    if let Some(m) = &metrics {
        app = app.merge(m.router());
    }

    let listener = TcpListener::bind(&cfg.listen)
        .await
        .with_context(|| format!("bind {}", cfg.listen))?;
    tracing::info!(addr = %cfg.listen, interval_secs = cfg.interval_secs, days = cfg.days, "share-watch started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("http server")?;

    // Stop ticking, let an in-flight cycle finish, then flush the outbox.
    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_task.await {
        tracing::warn!("scheduler task: {e}");
    }
    service.outbox.close();
    let pending = service.outbox.len();
    let grace = shutdown_grace(send_delay, pending);
    if tokio::time::timeout(grace, sender).await.is_err() {
        tracing::warn!(pending, "outbox not drained before shutdown");
    }
    Ok(())
}

/// Time allowed for the sender to flush `pending` queued messages.
fn shutdown_grace(send_delay: Duration, pending: usize) -> Duration {
    let sends = u32::try_from(pending).unwrap_or(u32::MAX).saturating_add(1);
    send_delay.saturating_mul(sends).max(Duration::from_secs(5))
}
