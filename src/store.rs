//! # Item Store
//! Durable snapshot of the most recent full fetch, kept as a headerless CSV
//! file with one `(published, url, title, metric)` row per article.
//!
//! Writes go to a sibling temp file that is then renamed over the snapshot,
//! so a concurrent reader (the HTTP view) sees either the old or the new
//! file, never a half-written one. Saves are serialized internally.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat};
use metrics::gauge;
use tokio::{fs, sync::Mutex};

use crate::error::{StoreError, StoreResult};
use crate::item::Item;

/// Default snapshot location, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "state/articles.csv";

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                write_lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Read the stored snapshot.
    ///
    /// A missing file is reported as [`StoreError::NotFound`]; callers that
    /// treat "no snapshot yet" as an empty baseline use [`Self::load_or_empty`].
    pub async fn load(&self) -> StoreResult<Vec<Item>> {
        let path = self.path();
        let bytes = match fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(StoreError::Unavailable {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        decode(path, &bytes)
    }

    /// Like [`Self::load`], but a missing snapshot is an empty one.
    pub async fn load_or_empty(&self) -> StoreResult<Vec<Item>> {
        match self.load().await {
            Err(StoreError::NotFound(p)) => {
                tracing::info!(target: "store", path = %p.display(), "no snapshot yet, starting from empty baseline");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Replace the whole snapshot with `items` (deduplicated by url, last
    /// write wins). Returns the number of rows written.
    pub async fn save(&self, items: &[Item]) -> StoreResult<usize> {
        let _guard = self.inner.write_lock.lock().await;
        let path = self.path();
        let unavailable = |source: std::io::Error| StoreError::Unavailable {
            path: path.to_path_buf(),
            source,
        };

        let rows = dedup_by_url(items);
        let bytes = encode(&rows).map_err(unavailable)?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(unavailable)?;
        }
        let tmp = temp_path(path);
        fs::write(&tmp, &bytes).await.map_err(unavailable)?;
        fs::rename(&tmp, path).await.map_err(unavailable)?;

        gauge!("snapshot_items").set(rows.len() as f64);
        tracing::debug!(target: "store", rows = rows.len(), path = %path.display(), "snapshot saved");
        Ok(rows.len())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Collapse repeated urls into one item each. The last sample wins but keeps
/// the position of the first occurrence.
pub fn dedup_by_url(items: &[Item]) -> Vec<Item> {
    let mut pos: HashMap<&str, usize> = HashMap::with_capacity(items.len());
    let mut out: Vec<Item> = Vec::with_capacity(items.len());
    for it in items {
        match pos.get(it.url.as_str()) {
            Some(&i) => out[i] = it.clone(),
            None => {
                pos.insert(it.url.as_str(), out.len());
                out.push(it.clone());
            }
        }
    }
    out
}

/// Lookup `url -> metric` used to diff a fresh sample against the baseline.
pub fn metric_index(items: &[Item]) -> HashMap<&str, u64> {
    items.iter().map(|it| (it.url.as_str(), it.metric)).collect()
}

fn encode(items: &[Item]) -> std::io::Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::with_capacity(items.len() * 128));
    for it in items {
        let published = it.published.to_rfc3339_opts(SecondsFormat::AutoSi, false);
        let metric = it.metric.to_string();
        wtr.write_record([published.as_str(), it.url.as_str(), it.title.as_str(), metric.as_str()])
            .map_err(std::io::Error::other)?;
    }
    wtr.into_inner().map_err(|e| std::io::Error::other(e.to_string()))
}

fn decode(path: &Path, bytes: &[u8]) -> StoreResult<Vec<Item>> {
    let malformed = |row: usize, reason: String| StoreError::Malformed {
        path: path.to_path_buf(),
        row,
        reason,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut out = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let row = i + 1;
        let rec = rec.map_err(|e| malformed(row, e.to_string()))?;
        if rec.len() != 4 {
            return Err(malformed(row, format!("expected 4 fields, got {}", rec.len())));
        }
        let published = DateTime::parse_from_rfc3339(&rec[0])
            .map_err(|e| malformed(row, format!("published {:?}: {e}", &rec[0])))?;
        let metric: u64 = rec[3]
            .parse()
            .map_err(|e| malformed(row, format!("metric {:?}: {e}", &rec[3])))?;
        out.push(Item::new(published, &rec[1], &rec[2], metric));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn item(url: &str, title: &str, metric: u64) -> Item {
        let published = jst().with_ymd_and_hms(2025, 9, 6, 0, 0, 0).unwrap();
        Item::new(published, url, title, metric)
    }

    #[test]
    fn dedup_keeps_last_sample() {
        let items = vec![item("a", "A", 1), item("b", "B", 2), item("a", "A2", 7)];
        let out = dedup_by_url(&items);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].url, "a");
        assert_eq!(out[0].metric, 7);
        assert_eq!(out[0].title, "A2");
    }

    #[test]
    fn encode_quotes_commas_and_quotes_in_titles() {
        let rows = vec![item("https://x/1", "Hello, \"world\"", 12)];
        let bytes = encode(&rows).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert_eq!(
            text.trim_end(),
            "2025-09-06T00:00:00+09:00,https://x/1,\"Hello, \"\"world\"\"\",12"
        );
        assert_eq!(decode(Path::new("mem"), &bytes).unwrap(), rows);
    }

    #[test]
    fn decode_rejects_short_rows_and_bad_metrics() {
        let short = b"2025-09-06T00:00:00+09:00,https://x/1,title\n";
        assert!(matches!(
            decode(Path::new("mem"), short),
            Err(StoreError::Malformed { row: 1, .. })
        ));

        let negative = b"2025-09-06T00:00:00+09:00,https://x/1,t,5\n2025-09-06T00:00:00+09:00,https://x/2,t,-3\n";
        assert!(matches!(
            decode(Path::new("mem"), negative),
            Err(StoreError::Malformed { row: 2, .. })
        ));
    }

    #[test]
    fn temp_path_is_a_sibling() {
        let p = temp_path(Path::new("state/articles.csv"));
        assert_eq!(p, PathBuf::from("state/articles.csv.tmp"));
    }
}
