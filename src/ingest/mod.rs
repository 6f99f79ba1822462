// src/ingest/mod.rs
pub mod listing;
pub mod share_count;
pub mod types;

pub use types::{ItemSource, ShareCounter};

use std::sync::Mutex;

use anyhow::{anyhow, Result};

use crate::item::Item;

/// In-memory source returning whatever sample was last staged. Handy for
/// demos and tests; a staged error is returned once and then cleared.
#[derive(Default)]
pub struct StaticSource {
    staged: Mutex<Staged>,
}

#[derive(Default)]
struct Staged {
    items: Vec<Item>,
    fail: Option<String>,
}

impl StaticSource {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            staged: Mutex::new(Staged { items, fail: None }),
        }
    }

    pub fn stage(&self, items: Vec<Item>) {
        let mut s = self.staged.lock().expect("static source mutex poisoned");
        s.items = items;
    }

    pub fn fail_next(&self, reason: impl Into<String>) {
        let mut s = self.staged.lock().expect("static source mutex poisoned");
        s.fail = Some(reason.into());
    }
}

#[async_trait::async_trait]
impl ItemSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<Item>> {
        let mut s = self.staged.lock().expect("static source mutex poisoned");
        if let Some(reason) = s.fail.take() {
            return Err(anyhow!(reason));
        }
        Ok(s.items.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
