//! # Threshold Decider
//! Pure banding rule: an article is worth a notification when its share
//! count climbs into a new 50-wide band since the previous sample.
//!
//! The first sighting of an article (`previous == 0`) never fires, so an
//! already-popular article discovered late does not flood the channel.

use serde::Deserialize;

/// Width of one band.
pub const BAND_WIDTH: u64 = 50;

/// Round `n` down to the nearest multiple of [`BAND_WIDTH`].
pub fn band(n: u64) -> u64 {
    (n / BAND_WIDTH) * BAND_WIDTH
}

/// `true` iff the article had a recorded count and advanced at least one band.
pub fn worthy(current: u64, previous: u64) -> bool {
    if previous == 0 {
        return false;
    }
    band(current).saturating_sub(band(previous)) >= BAND_WIDTH
}

/// Threshold policy used by the cycle.
///
/// `min_metric` is an optional absolute floor applied on top of [`worthy`]:
/// counts below it never fire even if they crossed a band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ThresholdPolicy {
    #[serde(default)]
    pub min_metric: Option<u64>,
}

impl ThresholdPolicy {
    pub fn with_floor(min_metric: u64) -> Self {
        Self {
            min_metric: Some(min_metric),
        }
    }

    pub fn is_worthy(&self, current: u64, previous: u64) -> bool {
        if let Some(floor) = self.min_metric {
            if current < floor {
                return false;
            }
        }
        worthy(current, previous)
    }
}
