//! Hyperliquid exchange integration.
//!
//! # Funding Rate Notes
//!
//! Hyperliquid funding is paid **hourly** at 1/8th of the computed 8-hour rate,
//! so one day of history is 24 records per coin.
//!
//! The `fundingHistory` request treats both `startTime` and `endTime` as
//! inclusive and returns at most 500 records per call.

mod client;
mod types;

pub use client::{HyperliquidClient, RetryPolicy};
pub use types::*;
