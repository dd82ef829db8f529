//! Configuration management for the funding history exporter.
//!
//! Loads settings from `.env`, an optional `config.{toml,yaml,json}` file and
//! `FHE_`-prefixed environment variables (e.g. `FHE_EXPORT__COIN=BTC`).

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// What to export and where
    #[serde(default)]
    pub export: ExportConfig,
    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Hyperliquid API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per request before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Pause after every request, in milliseconds
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Coin to export (e.g. "HYPE")
    #[serde(default = "default_coin")]
    pub coin: String,
    /// Output CSV path; generated from the coin when unset
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Add a `_YYYYMMDD_HHMMSS` suffix to the generated filename
    #[serde(default)]
    pub timestamped: bool,
    /// Days per request window
    #[serde(default = "default_chunk_days")]
    pub chunk_days: u32,
    /// Forced start (`YYYY-MM-DD` or Unix ms); skips earliest-data probing
    #[serde(default)]
    pub start_time: Option<String>,
    /// Candidate start dates probed for the earliest available data
    #[serde(default = "default_probe_dates")]
    pub probe_dates: Vec<String>,
    /// Start used when no probe date has data
    #[serde(default = "default_fallback_start")]
    pub fallback_start: String,
    /// Log and skip windows whose fetch fails instead of aborting
    #[serde(default)]
    pub continue_on_chunk_error: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for a daily rolling log file (stdout only when unset)
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

// Default value functions
fn default_base_url() -> String {
    "https://api.hyperliquid.xyz".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_rate_limit_delay_ms() -> u64 {
    100
}

fn default_coin() -> String {
    "HYPE".to_string()
}

fn default_chunk_days() -> u32 {
    20 // 480 hourly records, below the 500 record page limit
}

fn default_probe_dates() -> Vec<String> {
    ["2020-01-01", "2021-01-01", "2022-01-01", "2023-01-01"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

fn default_fallback_start() -> String {
    "2023-01-01".to_string()
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .prefix("FHE")
                    .prefix_separator("_"),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"),
            "base_url must be an http(s) URL"
        );
        anyhow::ensure!(self.api.timeout_secs > 0, "timeout_secs must be > 0");
        anyhow::ensure!(self.api.max_retries >= 1, "max_retries must be >= 1");

        anyhow::ensure!(!self.export.coin.trim().is_empty(), "coin must not be empty");
        anyhow::ensure!(self.export.chunk_days >= 1, "chunk_days must be >= 1");

        if let Some(start) = &self.export.start_time {
            parse_timestamp_ms(start).context("Invalid start_time")?;
        }
        for date in &self.export.probe_dates {
            parse_timestamp_ms(date).context("Invalid probe_dates entry")?;
        }
        parse_timestamp_ms(&self.export.fallback_start).context("Invalid fallback_start")?;

        Ok(())
    }
}

impl ExportConfig {
    /// Forced start in Unix milliseconds, if configured.
    pub fn forced_start_ms(&self) -> Result<Option<i64>> {
        self.start_time
            .as_deref()
            .map(parse_timestamp_ms)
            .transpose()
    }

    /// Probe candidates in Unix milliseconds, oldest first.
    pub fn probe_starts_ms(&self) -> Result<Vec<i64>> {
        let mut starts = self
            .probe_dates
            .iter()
            .map(|d| parse_timestamp_ms(d))
            .collect::<Result<Vec<_>>>()?;
        starts.sort_unstable();
        starts.dedup();
        Ok(starts)
    }

    pub fn fallback_start_ms(&self) -> Result<i64> {
        parse_timestamp_ms(&self.fallback_start)
    }
}

/// Parse `YYYY-MM-DD` (midnight UTC) or a Unix millisecond timestamp.
pub fn parse_timestamp_ms(value: &str) -> Result<i64> {
    let value = value.trim();
    if let Ok(ms) = value.parse::<i64>() {
        anyhow::ensure!(ms >= 0, "timestamp must not be negative: {}", value);
        return Ok(ms);
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Expected YYYY-MM-DD or Unix milliseconds, got '{}'", value))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context("Invalid midnight for date")?;

    Ok(Utc.from_utc_datetime(&midnight).timestamp_millis())
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            coin: default_coin(),
            output: None,
            timestamped: false,
            chunk_days: default_chunk_days(),
            start_time: None,
            probe_dates: default_probe_dates(),
            fallback_start: default_fallback_start(),
            continue_on_chunk_error: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.export.coin, "HYPE");
        assert_eq!(config.api.max_retries, 3);
    }

    #[test]
    fn test_empty_sections_take_defaults() {
        let config: Config = serde_json::from_str(r#"{"export": {"coin": "BTC"}}"#).unwrap();
        assert_eq!(config.export.coin, "BTC");
        assert_eq!(config.export.chunk_days, 20);
        assert_eq!(config.api.base_url, "https://api.hyperliquid.xyz");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.export.chunk_days = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.max_retries = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.export.start_time = Some("yesterday".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_timestamp_ms() {
        assert_eq!(parse_timestamp_ms("2023-01-01").unwrap(), 1672531200000);
        assert_eq!(parse_timestamp_ms("1733011200000").unwrap(), 1733011200000);
        assert!(parse_timestamp_ms("-5").is_err());
        assert!(parse_timestamp_ms("2023-13-01").is_err());
    }

    #[test]
    fn test_probe_starts_sorted_oldest_first() {
        let export = ExportConfig {
            probe_dates: vec![
                "2023-01-01".to_string(),
                "2021-01-01".to_string(),
                "2023-01-01".to_string(),
            ],
            ..ExportConfig::default()
        };
        assert_eq!(
            export.probe_starts_ms().unwrap(),
            vec![1609459200000, 1672531200000]
        );
        assert_eq!(export.forced_start_ms().unwrap(), None);
    }
}
