// tests/listing_source.rs
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::FixedOffset;
use share_watch::ingest::listing::ListingSource;
use share_watch::ingest::{ItemSource, ShareCounter};

struct MapCounter(HashMap<&'static str, u64>);

#[async_trait::async_trait]
impl ShareCounter for MapCounter {
    async fn count(&self, url: &str) -> Result<u64> {
        self.0
            .get(url)
            .copied()
            .ok_or_else(|| anyhow!("no count for {url}"))
    }
}

const PAGE_1: &str = r#"
<ul class="river">
  <li class="river-block " id="p1" data-permalink="http://jp.techcrunch.com/2025/09/05/alpha/" data-shareTitle="Alpha raises Series A" data-sharemessage="x">
    <h2>Alpha</h2>
  </li>
  <li class="river-block " id="p2" data-permalink="http://jp.techcrunch.com/2025/09/04/beta/" data-shareTitle="Beta &#8211; launch">
  </li>
</ul>"#;

const PAGE_2: &str = r#"
<ul class="river">
  <li class="river-block " id="p3" data-permalink="http://jp.techcrunch.com/2025/08/30/gamma/" data-shareTitle="Gamma">
</ul>"#;

#[tokio::test]
async fn fixture_pages_yield_items_with_counts() {
    let jst = FixedOffset::east_opt(9 * 3600).unwrap();
    let counter = MapCounter(HashMap::from([
        ("http://jp.techcrunch.com/2025/09/05/alpha/", 120u64),
        ("http://jp.techcrunch.com/2025/09/04/beta/", 55u64),
        ("http://jp.techcrunch.com/2025/08/30/gamma/", 7u64),
    ]));
    let source = ListingSource::from_fixture(
        vec![PAGE_1.to_string(), PAGE_2.to_string()],
        Arc::new(counter),
        jst,
    );

    let items = source.fetch().await.unwrap();
    assert_eq!(items.len(), 3);

    assert_eq!(items[0].title, "Alpha raises Series A");
    assert_eq!(items[0].metric, 120);
    assert_eq!(items[0].published.to_rfc3339(), "2025-09-05T00:00:00+09:00");

    // Entity-decoded title.
    assert_eq!(items[1].title, "Beta \u{2013} launch");
    assert_eq!(items[1].metric, 55);

    assert_eq!(items[2].url, "http://jp.techcrunch.com/2025/08/30/gamma/");
    assert_eq!(items[2].metric, 7);
}

#[tokio::test]
async fn failed_count_lookup_fails_the_fetch() {
    let jst = FixedOffset::east_opt(9 * 3600).unwrap();
    // No count for beta.
    let counter = MapCounter(HashMap::from([
        ("http://jp.techcrunch.com/2025/09/05/alpha/", 120u64),
        ("http://jp.techcrunch.com/2025/08/30/gamma/", 7u64),
    ]));
    let source = ListingSource::from_fixture(
        vec![PAGE_1.to_string(), PAGE_2.to_string()],
        Arc::new(counter),
        jst,
    );

    let err = source.fetch().await.unwrap_err();
    let text = format!("{err:#}");
    assert!(text.contains("share count http://jp.techcrunch.com/2025/09/04/beta/"), "{text}");
}

#[tokio::test]
async fn empty_listing_is_not_an_error() {
    let jst = FixedOffset::east_opt(9 * 3600).unwrap();
    let source = ListingSource::from_fixture(
        vec!["<html></html>".to_string()],
        Arc::new(MapCounter(HashMap::new())),
        jst,
    );
    assert!(source.fetch().await.unwrap().is_empty());
}
