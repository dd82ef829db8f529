//! Exchange integrations for funding history export.
//!
//! ## Hyperliquid
//! Read-only access to the public info endpoint for historical funding rates.

pub mod hyperliquid;
pub mod traits;

pub use hyperliquid::{FundingRecord, HyperliquidClient};
pub use traits::{FundingHistorySource, Venue};
