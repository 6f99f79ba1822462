//! Notification delivery: message formatting, the outbound queue and the
//! transports that actually send messages.

pub mod outbox;
pub mod webhook;

pub use outbox::{spawn_sender, Outbox};
pub use webhook::WebhookNotifier;

use anyhow::Result;

use crate::item::Item;

/// Word placed after the banded count, e.g. `"100 RT <title> <url>"`.
pub const DEFAULT_VERB: &str = "RT";

/// A delivery channel. Failures are reported to the caller, never retried here.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, message: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Dry-run transport: prints the message and logs it, sends nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, message: &str) -> Result<()> {
        println!("{message}");
        tracing::info!(target: "notify", text = %message, "dry-run: notification not sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// `"<banded> <verb> <title> <url>"`.
pub fn format_message(item: &Item, verb: &str) -> String {
    format!("{} {} {} {}", item.banded(), verb, item.title, item.url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn message_uses_banded_count() {
        let published = FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 9, 6, 0, 0, 0)
            .unwrap();
        let it = Item::new(published, "https://x/a", "Big news", 137);
        assert_eq!(format_message(&it, DEFAULT_VERB), "100 RT Big news https://x/a");
    }
}
