use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use super::Notifier;

/// Posts `{"text": "<message>"}` to an incoming-webhook url (Slack and
/// Mattermost style endpoints accept this shape).
#[derive(Clone)]
pub struct WebhookNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            webhook_url: url.into(),
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, message: &str) -> Result<()> {
        let body = serde_json::json!({ "text": message });

        self.client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("webhook post")?
            .error_for_status()
            .context("webhook non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
