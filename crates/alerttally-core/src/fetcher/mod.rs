//! Fetcher - pages of alerts from the alert search API
//!
//! The aggregator only sees the [`AlertSource`] trait, so a run can be driven
//! by the HTTP client or by any other page source.

mod client;

pub use client::HttpAlertSource;

use crate::error::Result;
use crate::models::{AlertPage, Cursor, TimeWindow};

/// Source of alert pages for a time window
#[async_trait::async_trait]
pub trait AlertSource: Send + Sync {
    /// Fetch one page of alerts created within `window`, continuing after
    /// `cursor` when given
    async fn fetch_page(&self, window: &TimeWindow, cursor: Option<&Cursor>) -> Result<AlertPage>;
}
