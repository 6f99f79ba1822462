// src/config.rs
//! Runtime configuration.
//!
//! Resolution order (later wins):
//! 1. built-in defaults,
//! 2. TOML file at `$SHARE_WATCH_CONFIG`, else `config/share_watch.toml` if present,
//! 3. `SHARE_WATCH_*` environment variables,
//! 4. command-line flags (applied by the binary).

use anyhow::{anyhow, Context, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::notify::DEFAULT_VERB;
use crate::store::DEFAULT_DATA_PATH;
use crate::threshold::ThresholdPolicy;

pub const ENV_CONFIG_PATH: &str = "SHARE_WATCH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/share_watch.toml";

/// Publish dates on the listing are Tokyo calendar dates.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Recency horizon in days.
    pub days: u32,
    /// Polling period in seconds.
    pub interval_secs: u64,
    /// Log notifications instead of sending them.
    pub dry_run: bool,
    pub data_path: PathBuf,
    /// Address of the read-only HTTP view.
    pub listen: String,
    pub verb: String,
    pub source: SourceConfig,
    pub notify: NotifyConfig,
    pub threshold: ThresholdPolicy,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub pages: u32,
    /// Share-count endpoint, queried as `<count_api>?url=<article>`.
    pub count_api: String,
    pub utc_offset_hours: i32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    /// Pause after every delivery.
    pub send_delay_secs: u64,
    pub queue_capacity: usize,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            days: 5,
            interval_secs: 20 * 60,
            dry_run: false,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            listen: "0.0.0.0:8080".to_string(),
            verb: DEFAULT_VERB.to_string(),
            source: SourceConfig::default(),
            notify: NotifyConfig::default(),
            threshold: ThresholdPolicy::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://jp.techcrunch.com".to_string(),
            pages: 3,
            count_api: "http://urls.api.twitter.com/1/urls/count.json".to_string(),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            timeout_secs: 10,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            send_delay_secs: 60,
            queue_capacity: 100,
            timeout_secs: 5,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing share-watch config")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using `$SHARE_WATCH_CONFIG`, then `config/share_watch.toml`,
    /// then defaults; environment overrides are applied on top.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_env(&mut self) {
        if let Some(v) = env_parse("SHARE_WATCH_DAYS") {
            self.days = v;
        }
        if let Some(v) = env_parse("SHARE_WATCH_INTERVAL_SECS") {
            self.interval_secs = v;
        }
        if let Some(v) = env_flag("SHARE_WATCH_DRY_RUN") {
            self.dry_run = v;
        }
        if let Ok(v) = std::env::var("SHARE_WATCH_DATA_PATH") {
            self.data_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SHARE_WATCH_LISTEN") {
            self.listen = v;
        }
        if let Ok(v) = std::env::var("SHARE_WATCH_WEBHOOK_URL") {
            let v = v.trim().to_string();
            self.notify.webhook_url = (!v.is_empty()).then_some(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(anyhow!("interval_secs must be > 0"));
        }
        self.zone()?;
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Fixed zone used to interpret listing dates, independent of the host.
    pub fn zone(&self) -> Result<FixedOffset> {
        self.source
            .utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow!("utc_offset_hours out of range: {}", self.source.utc_offset_hours))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    let v = std::env::var(key).ok()?;
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
