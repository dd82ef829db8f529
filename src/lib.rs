//! # Funding History Exporter
//!
//! Fetches the full historical funding rate series for a Hyperliquid
//! perpetual and saves it as a CSV file.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `exchange`: Hyperliquid info API client and the source trait
//! - `export`: Window planning, chunked fetching, CSV output and summary
//! - `errors`: Fetch and export error types
//! - `utils`: Shared utilities and decimal arithmetic

pub mod config;
pub mod errors;
pub mod exchange;
pub mod export;
pub mod utils;

pub use config::Config;
pub use errors::{ExportError, FetchError};
pub use export::{ExportSettings, ExportSummary, FundingExporter};
