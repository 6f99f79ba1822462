use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use std::time::Duration;

use crate::ingest::types::ShareCounter;

/// Share-count lookup against a JSON endpoint answering `{"count": <n>, ...}`
/// for `GET <endpoint>?url=<article url>`.
#[derive(Clone)]
pub struct HttpShareCounter {
    endpoint: String,
    client: Client,
    timeout: Duration,
}

impl HttpShareCounter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(&self.endpoint)
            .query(&[("url", url)])
            .timeout(self.timeout)
    }
}

#[async_trait]
impl ShareCounter for HttpShareCounter {
    async fn count(&self, url: &str) -> Result<u64> {
        let body = self
            .request(url)
            .send()
            .await
            .context("share count get()")?
            .error_for_status()
            .context("share count non-2xx")?
            .text()
            .await
            .context("share count .text()")?;
        counter!("share_count_lookups_total").increment(1);
        parse_count(&body)
    }
}

/// Extract the `count` field. Fractional or negative values are clamped to a
/// non-negative integer.
pub fn parse_count(body: &str) -> Result<u64> {
    let v: serde_json::Value = serde_json::from_str(body.trim()).context("share count json")?;
    let n = v
        .get("count")
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| anyhow!("share count response has no numeric `count`"))?;
    Ok(n.max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_integer_and_float_counts() {
        assert_eq!(parse_count(r#"{"count":42,"url":"https://x/"}"#).unwrap(), 42);
        assert_eq!(parse_count(r#"{"count": 7.0}"#).unwrap(), 7);
        assert_eq!(parse_count(r#"{"count": -3}"#).unwrap(), 0);
    }

    #[test]
    fn article_url_goes_in_encoded_query() {
        let req = HttpShareCounter::new("http://counts.test/count.json")
            .request("http://jp.techcrunch.com/2025/09/05/a?b=1&c=2")
            .build()
            .unwrap();
        assert_eq!(req.url().path(), "/count.json");
        let pairs: Vec<(String, String)> = req.url().query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![("url".to_string(), "http://jp.techcrunch.com/2025/09/05/a?b=1&c=2".to_string())]
        );
        assert!(!req.url().query().unwrap().contains('&'));
    }

    #[test]
    fn missing_count_is_an_error() {
        assert!(parse_count(r#"{"url":"https://x/"}"#).is_err());
        assert!(parse_count("not json").is_err());
    }
}
