// src/ingest/types.rs
use anyhow::Result;

use crate::item::Item;

/// Produces a full fresh sample of articles with their current share counts.
#[async_trait::async_trait]
pub trait ItemSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Item>>;
    fn name(&self) -> &'static str;
}

/// Looks up the current share count for one article url.
#[async_trait::async_trait]
pub trait ShareCounter: Send + Sync {
    async fn count(&self, url: &str) -> Result<u64>;
}
