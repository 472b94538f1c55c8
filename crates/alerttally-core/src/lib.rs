//! # alerttally
//!
//! Monthly alert and event counts per manager, pulled from an AIOps alert
//! search API.
//!
//! ## Architecture
//!
//! - **Fetcher**: one page of alerts per request for a time window and cursor
//! - **Aggregator**: walks the lookback range window by window and folds every
//!   alert into a month → manager tally
//! - **Report**: managers per month, busiest first, as text or JSON
//!
//! ## Quick Start
//!
//! ```bash
//! export ALERTTALLY_API__API_KEY=...
//! alerttally
//!
//! # Reproduce the single-page, carried-cursor behaviour of older reports
//! alerttally --legacy
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod aggregator;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::aggregator::{Aggregator, MonthlyReport, MonthlyTally, RunSettings};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::fetcher::{AlertSource, HttpAlertSource};
    pub use crate::models::*;
}
