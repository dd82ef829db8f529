//! Funding history export pipeline.
//!
//! A run is strictly sequential:
//! 1. Resolve the start time (forced, or probed for the earliest data)
//! 2. Fetch `[start, now)` window by window from the source
//! 3. Write every record, in source order, to the CSV
//! 4. Log a summary

mod summary;
pub mod window;
pub mod writer;

pub use summary::{ExportSummary, RateStats};
pub use window::{plan_windows, TimeWindow};

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ExportConfig;
use crate::errors::ExportError;
use crate::exchange::{FundingHistorySource, FundingRecord};
use window::format_ms;

/// Resolved, validated settings for one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub coin: String,
    pub output_path: PathBuf,
    pub chunk_days: u32,
    pub forced_start: Option<i64>,
    /// Probe candidates, oldest first
    pub probe_starts: Vec<i64>,
    pub fallback_start: i64,
    pub continue_on_chunk_error: bool,
}

impl ExportSettings {
    /// Resolve settings from configuration; `now` names timestamped outputs.
    pub fn from_config(export: &ExportConfig, now: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            coin: export.coin.trim().to_string(),
            output_path: writer::resolve_output_path(export, now),
            chunk_days: export.chunk_days,
            forced_start: export.forced_start_ms()?,
            probe_starts: export.probe_starts_ms()?,
            fallback_start: export.fallback_start_ms()?,
            continue_on_chunk_error: export.continue_on_chunk_error,
        })
    }
}

/// Fetches a coin's funding history from a source and saves it as CSV.
pub struct FundingExporter<S> {
    source: S,
    settings: ExportSettings,
}

impl<S: FundingHistorySource> FundingExporter<S> {
    pub fn new(source: S, settings: ExportSettings) -> Self {
        Self { source, settings }
    }

    /// Export everything from the start time up to now.
    pub async fn run(&self) -> Result<ExportSummary, ExportError> {
        self.run_until(Utc::now().timestamp_millis()).await
    }

    /// Export everything from the start time up to `end` (Unix ms, exclusive).
    #[instrument(skip(self), fields(coin = %self.settings.coin))]
    pub async fn run_until(&self, end: i64) -> Result<ExportSummary, ExportError> {
        info!(
            "Starting historical funding rate fetch for {} on {}",
            self.settings.coin,
            self.source.venue()
        );

        let start = self.resolve_start(end).await;
        info!(
            "Fetching funding rates from {} to {}",
            format_ms(start),
            format_ms(end)
        );

        let (records, failed_chunks) = self.fetch_all(start, end).await?;

        let path = &self.settings.output_path;
        info!(
            "Saving {} funding rate entries to {}",
            records.len(),
            path.display()
        );
        writer::write_records(path, &records)?;
        info!("Successfully saved funding rates to {}", path.display());

        let summary = ExportSummary::new(
            &self.settings.coin,
            path.clone(),
            &records,
            failed_chunks,
        );
        summary.log();
        Ok(summary)
    }

    async fn resolve_start(&self, now: i64) -> i64 {
        match self.settings.forced_start {
            Some(start) => {
                info!("Using forced start date: {}", format_ms(start));
                start
            }
            None => self.find_earliest_start(now).await,
        }
    }

    /// Probe candidate start dates, oldest first, for the first one with data.
    ///
    /// Probe failures are only warnings; the export itself still fails loudly
    /// if the source is unreachable.
    pub async fn find_earliest_start(&self, now: i64) -> i64 {
        info!("Searching for earliest available funding data...");

        for &candidate in &self.settings.probe_starts {
            if candidate >= now {
                continue;
            }

            let probe = TimeWindow::probe(candidate, now);
            info!("Testing start date: {}", format_ms(candidate));

            match self
                .source
                .funding_history(&self.settings.coin, probe.start, probe.end)
                .await
            {
                Ok(records) if !records.is_empty() => {
                    info!(
                        "Found earliest data starting from: {}",
                        format_ms(candidate)
                    );
                    return candidate;
                }
                Ok(_) => debug!("No data in probe window {}", probe),
                Err(e) => warn!("Error testing date {}: {}", format_ms(candidate), e),
            }
        }

        let fallback = self.settings.fallback_start;
        warn!(
            "Could not determine earliest data date, using {} as default",
            format_ms(fallback)
        );
        fallback
    }

    /// Fetch every window in order, concatenating records as returned.
    ///
    /// Returns the records and the number of windows skipped after a failure.
    pub async fn fetch_all(
        &self,
        start: i64,
        end: i64,
    ) -> Result<(Vec<FundingRecord>, usize), ExportError> {
        let windows = plan_windows(start, end, self.settings.chunk_days);
        let total = windows.len();
        info!(
            "Fetching funding rates in {} chunks of {} days each",
            total, self.settings.chunk_days
        );

        let page_limit = self.source.page_limit();
        let mut records = Vec::new();
        let mut failed_chunks = 0;

        for (i, window) in windows.iter().enumerate() {
            let chunk = i + 1;
            info!("Fetching chunk {}/{}: {}", chunk, total, window);

            match self
                .source
                .funding_history(&self.settings.coin, window.start, window.end)
                .await
            {
                Ok(batch) if batch.is_empty() => info!("No data found for this chunk"),
                Ok(batch) => {
                    info!("Retrieved {} funding rate entries", batch.len());
                    if page_limit.is_some_and(|limit| batch.len() >= limit) {
                        warn!(
                            "Chunk {} hit the {} record response limit and may be truncated; lower chunk_days",
                            chunk,
                            batch.len()
                        );
                    }
                    records.extend(batch);
                }
                Err(source) if self.settings.continue_on_chunk_error => {
                    error!("Error fetching chunk {}: {}", chunk, source);
                    failed_chunks += 1;
                }
                Err(source) => return Err(ExportError::Fetch { chunk, source }),
            }
        }

        info!("Total funding rate entries retrieved: {}", records.len());
        Ok((records, failed_chunks))
    }
}
