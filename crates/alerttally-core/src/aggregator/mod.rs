//! Aggregator - monthly alert and event counts per manager
//!
//! Walks the lookback range in fixed windows, asks the fetcher for each
//! window's alerts and folds them into a month → manager tally, which is then
//! turned into a sorted report.

mod report;
mod runner;
mod tally;

pub use report::{MonthSection, MonthlyReport, ReportRow};
pub use runner::{Aggregator, RunSettings, RunStats};
pub use tally::{ManagerCounts, MonthlyTally};
