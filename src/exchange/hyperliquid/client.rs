//! Hyperliquid REST API client.
//!
//! Read-only access to the public info endpoint:
//! - Historical funding rates per coin
//!
//! Every call goes through `post_info`, which applies the
//! retry policy and the pause between requests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::types::*;
use crate::config::ApiConfig;
use crate::errors::FetchError;
use crate::exchange::traits::{FundingHistorySource, Venue};

const INFO_ENDPOINT: &str = "/info";
const USER_AGENT: &str = concat!("funding-history-exporter/", env!("CARGO_PKG_VERSION"));

/// Bounded retry with exponential backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on every further attempt.
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_secs(1),
        }
    }
}

/// Hyperliquid API client for fetching funding history.
#[derive(Debug, Clone)]
pub struct HyperliquidClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
    request_delay: Duration,
}

impl HyperliquidClient {
    /// Create a client from API configuration.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy {
                max_attempts: config.max_retries,
                ..RetryPolicy::default()
            },
            request_delay: Duration::from_millis(config.rate_limit_delay_ms),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get funding history for a specific coin.
    #[instrument(skip(self), name = "hl_get_funding_history")]
    pub async fn get_funding_history(
        &self,
        coin: &str,
        start_time: i64,
        end_time: Option<i64>,
    ) -> Result<Vec<FundingRecord>, FetchError> {
        let request = InfoRequest::FundingHistory {
            coin: coin.to_string(),
            start_time,
            end_time,
        };

        let records: Vec<FundingRecord> = self.post_info(&request).await?;

        debug!(
            "Fetched {} funding history records for {}",
            records.len(),
            coin
        );
        Ok(records)
    }

    /// POST an info request, retrying transient failures.
    async fn post_info<T: DeserializeOwned>(&self, request: &InfoRequest) -> Result<T, FetchError> {
        let mut attempt = 0;
        loop {
            match self.send_info(request).await {
                Ok(value) => {
                    if !self.request_delay.is_zero() {
                        tokio::time::sleep(self.request_delay).await;
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt + 1 < self.retry.max_attempts => {
                    let backoff = self.retry.backoff(attempt);
                    warn!(
                        "Request attempt {} failed: {} (retrying in {:?})",
                        attempt + 1,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_info<T: DeserializeOwned>(&self, request: &InfoRequest) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, INFO_ENDPOINT);
        debug!("POST {} {:?}", url, request);

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            endpoint: INFO_ENDPOINT.to_string(),
            source,
        })
    }
}

#[async_trait]
impl FundingHistorySource for HyperliquidClient {
    fn venue(&self) -> Venue {
        Venue::Hyperliquid
    }

    fn page_limit(&self) -> Option<usize> {
        Some(FUNDING_HISTORY_PAGE_LIMIT)
    }

    async fn funding_history(
        &self,
        coin: &str,
        start_time: i64,
        end_time: i64,
    ) -> Result<Vec<FundingRecord>, FetchError> {
        self.get_funding_history(coin, start_time, Some(end_time))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(base_url: String, timeout_secs: u64) -> HyperliquidClient {
        let config = ApiConfig {
            base_url,
            timeout_secs,
            max_retries: 3,
            rate_limit_delay_ms: 0,
        };
        HyperliquidClient::new(&config)
            .unwrap()
            .with_retry_policy(RetryPolicy {
                max_attempts: 3,
                base_backoff: Duration::from_millis(1),
            })
    }

    fn test_client(server: &MockServer) -> HyperliquidClient {
        client_for(format!("{}/", server.uri()), 5)
    }

    /// Base URL of a local port with nothing listening on it.
    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}")
    }

    fn sample_body() -> serde_json::Value {
        json!([
            {"coin": "HYPE", "fundingRate": "0.0000125", "premium": "-0.00021883", "time": 1733011200000_i64},
            {"coin": "HYPE", "fundingRate": "0.0000125", "premium": "0.00003", "time": 1733014800000_i64}
        ])
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_fetch_funding_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/info"))
            .and(body_json(json!({
                "type": "fundingHistory",
                "coin": "HYPE",
                "startTime": 1733011200000_i64,
                "endTime": 1733097600000_i64
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert_eq!(client.base_url(), server.uri());

        let records = client
            .funding_history("HYPE", 1733011200000, 1733097600000)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].funding_rate, dec!(0.0000125));
        assert_eq!(records[1].time, 1733014800000);
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let records = client.funding_history("HYPE", 0, 1).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.funding_history("HYPE", 0, 1).await.unwrap_err();

        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, reqwest::StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let client = client_for(closed_port_url(), 5);
        let err = client.funding_history("HYPE", 0, 1).await.unwrap_err();

        assert!(matches!(err, FetchError::Http(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_timeouts_are_retried_until_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/info"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(sample_body())
                    .set_delay(Duration::from_secs(3)),
            )
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(server.uri(), 1);
        let err = client.funding_history("HYPE", 0, 1).await.unwrap_err();

        match err {
            FetchError::Http(e) => assert!(e.is_timeout()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(client.funding_history("HYPE", 0, 1).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.funding_history("HYPE", 0, 1).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_fetch() {
        let client = HyperliquidClient::new(&ApiConfig::default()).unwrap();
        let now = chrono::Utc::now().timestamp_millis();
        let records = client
            .get_funding_history("HYPE", now - 24 * 60 * 60 * 1000, Some(now))
            .await
            .unwrap();

        assert!(!records.is_empty());
        println!("Fetched {} HYPE funding records", records.len());
    }
}
