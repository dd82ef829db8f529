//! Source abstraction for funding history data.
//!
//! The exporter only needs one thing from a venue: the funding records for a
//! coin inside a closed time window. Keeping that behind a trait lets the
//! export pipeline run against the live Hyperliquid client or a mock.

use async_trait::async_trait;
use std::fmt;

use crate::errors::FetchError;
use crate::exchange::hyperliquid::FundingRecord;

/// Venue identifier, used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Venue {
    Hyperliquid,
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::Hyperliquid => write!(f, "Hyperliquid"),
        }
    }
}

/// Trait for venues that serve historical funding rates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundingHistorySource: Send + Sync {
    /// Returns the venue identifier.
    fn venue(&self) -> Venue;

    /// Most records one request can return, if the venue caps responses.
    fn page_limit(&self) -> Option<usize>;

    /// Fetch funding records for `coin` with `start_time <= time <= end_time`
    /// (Unix milliseconds), in the order the venue returns them.
    async fn funding_history(
        &self,
        coin: &str,
        start_time: i64,
        end_time: i64,
    ) -> Result<Vec<FundingRecord>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venue_display() {
        assert_eq!(Venue::Hyperliquid.to_string(), "Hyperliquid");
    }
}
