//! Type definitions for Hyperliquid API requests and responses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request type for Hyperliquid info endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum InfoRequest {
    /// Get funding rate history.
    #[serde(rename = "fundingHistory")]
    FundingHistory {
        coin: String,
        #[serde(rename = "startTime")]
        start_time: i64,
        #[serde(rename = "endTime", skip_serializing_if = "Option::is_none")]
        end_time: Option<i64>,
    },
}

/// Historical funding rate record.
///
/// Field order matches the upstream JSON object and is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRecord {
    /// Asset symbol
    pub coin: String,
    /// Hourly funding rate at this timestamp
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub funding_rate: Decimal,
    /// Premium component
    #[serde(deserialize_with = "deserialize_decimal_str")]
    pub premium: Decimal,
    /// Timestamp in milliseconds
    pub time: i64,
}

impl FundingRecord {
    /// CSV header, also written when there are no records.
    pub const CSV_HEADER: [&'static str; 4] = ["coin", "fundingRate", "premium", "time"];
}

/// Maximum number of records the info endpoint returns for one request.
pub const FUNDING_HISTORY_PAGE_LIMIT: usize = 500;

// Hyperliquid encodes decimals as strings

fn deserialize_decimal_str<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    s.parse::<Decimal>().map_err(serde::de::Error::custom)
}
