//! Post-export summary statistics.

use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{info, warn};

use super::window::format_ms;
use crate::exchange::FundingRecord;
use crate::utils::decimal::{annualize_hourly, round_to_precision, safe_div};

/// Funding rate statistics over the exported records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateStats {
    pub average: Decimal,
    pub min: Decimal,
    pub max: Decimal,
}

/// Outcome of a completed export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub coin: String,
    pub output_path: PathBuf,
    pub total_entries: usize,
    /// Windows that failed and were skipped
    pub failed_chunks: usize,
    /// Times of the first and last exported record
    pub time_range: Option<(i64, i64)>,
    pub rates: Option<RateStats>,
}

impl ExportSummary {
    pub fn new(
        coin: &str,
        output_path: PathBuf,
        records: &[FundingRecord],
        failed_chunks: usize,
    ) -> Self {
        let time_range = match (records.first(), records.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        };

        Self {
            coin: coin.to_string(),
            output_path,
            total_entries: records.len(),
            failed_chunks,
            time_range,
            rates: rate_stats(records),
        }
    }

    /// Write the summary to the log.
    pub fn log(&self) {
        if self.failed_chunks > 0 {
            warn!("{} chunk(s) failed and were skipped", self.failed_chunks);
        }

        let (Some((first, last)), Some(rates)) = (self.time_range, &self.rates) else {
            warn!("No funding rate data found for the specified time range");
            return;
        };

        info!("=== SUMMARY ===");
        info!("Total entries: {}", self.total_entries);
        info!("Date range: {} to {}", format_ms(first), format_ms(last));
        info!("Output file: {}", self.output_path.display());
        info!("Average funding rate: {:.6}", rates.average);
        info!("Min funding rate: {:.6}", rates.min);
        info!("Max funding rate: {:.6}", rates.max);
        info!(
            "Average annualized rate: {}%",
            round_to_precision(annualize_hourly(rates.average) * Decimal::ONE_HUNDRED, 2)
        );
    }
}

fn rate_stats(records: &[FundingRecord]) -> Option<RateStats> {
    let first = records.first()?.funding_rate;

    let (sum, min, max) = records.iter().fold(
        (Decimal::ZERO, first, first),
        |(sum, min, max), r| (sum + r.funding_rate, min.min(r.funding_rate), max.max(r.funding_rate)),
    );

    Some(RateStats {
        average: safe_div(sum, Decimal::from(records.len())),
        min,
        max,
    })
}
