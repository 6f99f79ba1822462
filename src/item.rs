//! # Item
//! One discovered article together with its latest share count.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A single article as sampled in one fetch.
///
/// `url` is the identity: two items with the same url describe the same
/// article and a later sample replaces an earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub published: DateTime<FixedOffset>,
    pub url: String,
    pub title: String,
    pub metric: u64,
}

impl Item {
    pub fn new(
        published: DateTime<FixedOffset>,
        url: impl Into<String>,
        title: impl Into<String>,
        metric: u64,
    ) -> Self {
        Self {
            published,
            url: url.into(),
            title: title.into(),
            metric,
        }
    }

    /// Share count rounded down to its band, as shown in notifications.
    pub fn banded(&self) -> u64 {
        crate::threshold::band(self.metric)
    }
}
