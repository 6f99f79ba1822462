//! # Window Filter
//! Keeps only articles published within the last `horizon_days`.

use chrono::{DateTime, Duration, TimeZone};

use crate::item::Item;

/// Items whose age at `now` is at most `horizon_days * 24h`.
///
/// Articles dated after `now` have a negative age and are kept: a listing
/// clock slightly ahead of ours must not hide fresh articles.
pub fn windowed<Tz: TimeZone>(items: &[Item], horizon_days: u32, now: &DateTime<Tz>) -> Vec<Item> {
    let horizon = Duration::hours(i64::from(horizon_days) * 24);
    items
        .iter()
        .filter(|it| now.clone().signed_duration_since(it.published) <= horizon)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn at(ts: DateTime<Utc>) -> Item {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        Item::new(ts.with_timezone(&jst), format!("https://x/{}", ts.timestamp()), "t", 1)
    }

    #[test]
    fn boundary_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap();
        let edge = now - Duration::days(5);
        let past_edge = edge - Duration::seconds(1);
        let items = vec![at(now), at(edge), at(past_edge)];

        let kept = windowed(&items, 5, &now);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|i| i.published.with_timezone(&Utc) >= edge));
    }

    #[test]
    fn future_items_are_kept() {
        let now = Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap();
        let items = vec![at(now + Duration::hours(30))];
        assert_eq!(windowed(&items, 1, &now).len(), 1);
    }

    #[test]
    fn zero_horizon_keeps_only_now_and_later() {
        let now = Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap();
        let items = vec![at(now), at(now - Duration::seconds(1))];
        let kept = windowed(&items, 0, &now);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].published.with_timezone(&Utc), now);
    }
}
