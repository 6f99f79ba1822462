//! Demo that pushes a few staged samples through real cycles (stdout/log only).

use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Utc};
use share_watch::cycle::{CycleSettings, Orchestrator};
use share_watch::ingest::StaticSource;
use share_watch::notify::{spawn_sender, LogNotifier, Outbox};
use share_watch::{Item, SnapshotStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let dir = std::env::temp_dir().join(format!("share-watch-demo-{}", std::process::id()));
    let store = SnapshotStore::new(dir.join("articles.csv"));
    let source = Arc::new(StaticSource::default());
    let outbox = Outbox::bounded(16);
    let sender = spawn_sender(outbox.clone(), Arc::new(LogNotifier), Duration::from_millis(200));

    let orch = Orchestrator::new(
        source.clone(),
        store,
        outbox.clone(),
        CycleSettings {
            days: 5,
            verb: "RT".into(),
            threshold: Default::default(),
        },
    );

    let jst = FixedOffset::east_opt(9 * 3600).ok_or_else(|| anyhow::anyhow!("bad offset"))?;
    let published = Utc::now().with_timezone(&jst);
    for count in [40u64, 60, 110, 149, 150] {
        source.stage(vec![Item::new(published, "https://example.com/a", "Demo article", count)]);
        let report = orch.run_cycle().await?;
        println!("count={count} notified={}", report.notifications.len());
    }

    outbox.close();
    sender.await?;
    let _ = tokio::fs::remove_dir_all(&dir).await;
    println!("cycle-demo done");
    Ok(())
}
