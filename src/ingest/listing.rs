use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::{ItemSource, ShareCounter};
use crate::item::Item;

static RE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<li\b[^>]*\briver-block\b[^>]*>"#).expect("block regex"));
static RE_PERMALINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)data-permalink="([^"]+)""#).expect("permalink regex"));
static RE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)data-sharetitle="([^"]+)""#).expect("title regex"));
static RE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(20\d{2})/(\d{1,2})/(\d{1,2})\b").expect("date regex"));

/// Article as read from a listing page, before its share count is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub published: DateTime<FixedOffset>,
    pub url: String,
    pub title: String,
}

/// Scrapes paginated article listings and attaches a share count to every
/// article found.
pub struct ListingSource {
    mode: Mode,
    counter: Arc<dyn ShareCounter>,
    zone: FixedOffset,
}

enum Mode {
    /// Pre-fetched page bodies, one per listing page.
    Fixture(Vec<String>),
    Http {
        base_url: String,
        pages: u32,
        client: reqwest::Client,
    },
}

impl ListingSource {
    pub fn from_url(
        base_url: impl Into<String>,
        pages: u32,
        counter: Arc<dyn ShareCounter>,
        zone: FixedOffset,
    ) -> Self {
        Self {
            mode: Mode::Http {
                base_url: base_url.into(),
                pages: pages.max(1),
                client: reqwest::Client::new(),
            },
            counter,
            zone,
        }
    }

    pub fn from_fixture(pages: Vec<String>, counter: Arc<dyn ShareCounter>, zone: FixedOffset) -> Self {
        Self {
            mode: Mode::Fixture(pages),
            counter,
            zone,
        }
    }

    async fn page_bodies(&self) -> Result<Vec<String>> {
        match &self.mode {
            Mode::Fixture(pages) => Ok(pages.clone()),
            Mode::Http {
                base_url,
                pages,
                client,
            } => {
                let mut out = Vec::with_capacity(*pages as usize);
                for n in 1..=*pages {
                    let url = page_url(base_url, n);
                    let body = client
                        .get(&url)
                        .send()
                        .await
                        .and_then(|r| r.error_for_status())
                        .with_context(|| format!("listing get() {url}"))?
                        .text()
                        .await
                        .with_context(|| format!("listing .text() {url}"))?;
                    out.push(body);
                }
                Ok(out)
            }
        }
    }
}

#[async_trait]
impl ItemSource for ListingSource {
    async fn fetch(&self) -> Result<Vec<Item>> {
        let bodies = self.page_bodies().await?;

        let t0 = std::time::Instant::now();
        let entries: Vec<ListingEntry> = bodies
            .iter()
            .flat_map(|b| parse_listing(b, self.zone))
            .collect();
        histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let mut items = Vec::with_capacity(entries.len());
        for e in entries {
            // A failed lookup fails the whole sample.
            let metric = self
                .counter
                .count(&e.url)
                .await
                .inspect_err(|_| counter!("share_count_errors_total").increment(1))
                .with_context(|| format!("share count {}", e.url))?;
            items.push(Item::new(e.published, e.url, e.title, metric));
        }
        counter!("ingest_items_total").increment(items.len() as u64);
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "listing"
    }
}

/// Page 1 is the listing root, later pages live under `/page/<n>/`.
pub fn page_url(base: &str, n: u32) -> String {
    let base = base.trim_end_matches('/');
    if n <= 1 {
        base.to_string()
    } else {
        format!("{base}/page/{n}/")
    }
}

/// Extract every article block from one listing page. Blocks missing a
/// permalink, title or date are skipped.
pub fn parse_listing(html: &str, zone: FixedOffset) -> Vec<ListingEntry> {
    RE_BLOCK
        .find_iter(html)
        .filter_map(|m| {
            let entry = parse_block(m.as_str(), zone);
            if entry.is_none() {
                tracing::warn!(target: "ingest", block = m.as_str(), "skipping unparsable listing block");
            }
            entry
        })
        .collect()
}

fn parse_block(tag: &str, zone: FixedOffset) -> Option<ListingEntry> {
    let url = RE_PERMALINK.captures(tag)?.get(1)?.as_str();
    let title = RE_TITLE.captures(tag)?.get(1)?.as_str();
    let published = published_at(url, zone).or_else(|| published_at(tag, zone))?;
    Some(ListingEntry {
        published,
        url: html_escape::decode_html_entities(url).into_owned(),
        title: html_escape::decode_html_entities(title).trim().to_string(),
    })
}

/// First `YYYY/MM/DD` in `s`, as midnight in `zone`.
fn published_at(s: &str, zone: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let c = RE_DATE.captures(s)?;
    let date = NaiveDate::from_ymd_opt(c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?)?;
    zone.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single()
}
