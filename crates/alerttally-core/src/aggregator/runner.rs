//! Window-by-window driver for the fetcher

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{CursorPolicy, PaginationMode, WindowConfig};
use crate::error::Result;
use crate::fetcher::AlertSource;
use crate::models::{Cursor, TimeWindow};

use super::tally::MonthlyTally;

/// Settings for a single aggregation run
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Width of each query window
    pub width: chrono::Duration,
    /// Pause after every request
    pub delay: Duration,
    /// Pages requested per window
    pub pagination: PaginationMode,
    /// Cursor handling across windows
    pub cursor: CursorPolicy,
    /// Upper bound on pages drained from one window
    pub max_pages_per_window: u32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from(&WindowConfig::default())
    }
}

impl From<&WindowConfig> for RunSettings {
    fn from(config: &WindowConfig) -> Self {
        Self {
            width: chrono::Duration::hours(i64::from(config.width_hours)),
            delay: config.delay,
            pagination: config.pagination,
            cursor: config.cursor,
            max_pages_per_window: config.max_pages_per_window,
        }
    }
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Windows processed
    pub windows: u64,
    /// Requests sent
    pub pages: u64,
    /// Alerts folded
    pub alerts: u64,
}

/// Drives an [`AlertSource`] across consecutive windows and folds every
/// returned alert into a [`MonthlyTally`]
pub struct Aggregator<S> {
    source: S,
    settings: RunSettings,
}

impl<S: AlertSource> Aggregator<S> {
    /// Create a new aggregator
    pub fn new(source: S, settings: RunSettings) -> Self {
        Self { source, settings }
    }

    /// Page source this aggregator drives
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Process every window in `[start, now)`.
    ///
    /// Alerts are attributed to the month of the window start. The first
    /// fetch error aborts the run and no partial tally is returned.
    pub async fn run(
        &self,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(MonthlyTally, RunStats)> {
        let mut tally = MonthlyTally::new();
        let mut stats = RunStats::default();
        let mut cursor: Option<Cursor> = None;

        info!(
            start = %start,
            now = %now,
            pagination = ?self.settings.pagination,
            cursor_policy = ?self.settings.cursor,
            "Starting aggregation"
        );

        for window in TimeWindow::series(start, now, self.settings.width) {
            if self.settings.cursor == CursorPolicy::Reset {
                cursor = None;
            }

            let month = window.month_key();
            tally.open_month(&month);
            stats.windows += 1;

            let mut pages_in_window = 0u32;
            loop {
                let page = self.source.fetch_page(&window, cursor.as_ref()).await?;
                pages_in_window += 1;
                stats.pages += 1;
                stats.alerts += page.records.len() as u64;

                debug!(
                    window = %window,
                    month = %month,
                    records = page.records.len(),
                    "Folding page"
                );
                tally.fold_page(&month, &page.records);

                let page_was_empty = page.is_empty();
                cursor = page.next_cursor;
                match &cursor {
                    Some(c) => info!(cursor = %c, "Searching after alert id"),
                    None => info!("Searching after alert id: none"),
                }

                if !self.settings.delay.is_zero() {
                    tokio::time::sleep(self.settings.delay).await;
                }

                if !self.has_more_pages(cursor.is_some(), page_was_empty, pages_in_window, &window)
                {
                    break;
                }
            }
        }

        info!(
            windows = stats.windows,
            pages = stats.pages,
            alerts = stats.alerts,
            "Aggregation finished"
        );

        Ok((tally, stats))
    }

    fn has_more_pages(
        &self,
        has_cursor: bool,
        page_was_empty: bool,
        pages_in_window: u32,
        window: &TimeWindow,
    ) -> bool {
        if self.settings.pagination == PaginationMode::SinglePage
            || !has_cursor
            || page_was_empty
        {
            return false;
        }
        if pages_in_window >= self.settings.max_pages_per_window {
            warn!(
                window = %window,
                pages = pages_in_window,
                "Page limit reached for window, remaining alerts are skipped"
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{AlertPage, AlertRecord};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Hands out scripted pages and records every request
    #[derive(Default)]
    struct ScriptedSource {
        pages: Mutex<VecDeque<Result<AlertPage>>>,
        calls: Mutex<Vec<(TimeWindow, Option<Cursor>)>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<AlertPage>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                calls: Mutex::default(),
            }
        }

        fn calls(&self) -> Vec<(TimeWindow, Option<Cursor>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl AlertSource for ScriptedSource {
        async fn fetch_page(
            &self,
            window: &TimeWindow,
            cursor: Option<&Cursor>,
        ) -> Result<AlertPage> {
            self.calls.lock().unwrap().push((*window, cursor.cloned()));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(AlertPage::default()))
        }
    }

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, d, h, 0, 0).unwrap()
    }

    fn alert(manager: &str, events: u64) -> AlertRecord {
        AlertRecord {
            manager: Some(manager.to_string()),
            alert_id: None,
            event_count: Some(events),
        }
    }

    fn cursor(id: u64) -> Option<Cursor> {
        Some(Cursor(json!([id])))
    }

    fn settings(pagination: PaginationMode, cursor: CursorPolicy) -> RunSettings {
        RunSettings {
            delay: Duration::ZERO,
            pagination,
            cursor,
            ..RunSettings::default()
        }
    }

    #[tokio::test]
    async fn test_end_to_end_first_window() {
        let source = ScriptedSource::new(vec![Ok(AlertPage::new(
            vec![alert("ALPHA", 10), alert("ALPHA", 5), alert("BETA", 1)],
            None,
        ))]);
        let aggregator = Aggregator::new(
            source,
            settings(PaginationMode::Drain, CursorPolicy::Reset),
        );

        let (tally, stats) = aggregator.run(utc(1, 0), utc(1, 8)).await.unwrap();

        let alpha = tally.get("2024-07", "ALPHA").unwrap();
        assert_eq!((alpha.alert_count, alpha.event_count), (2, 15));
        let beta = tally.get("2024-07", "BETA").unwrap();
        assert_eq!((beta.alert_count, beta.event_count), (1, 1));
        assert_eq!(
            stats,
            RunStats {
                windows: 2,
                pages: 2,
                alerts: 3
            }
        );

        let report = crate::aggregator::MonthlyReport::from_tally(&tally);
        let rendered = report.to_string();
        let alpha_at = rendered.find("Manager: ALPHA, Total Alerts: 2, Total Events: 15");
        let beta_at = rendered.find("Manager: BETA, Total Alerts: 1, Total Events: 1");
        assert!(alpha_at.unwrap() < beta_at.unwrap());
    }

    #[tokio::test]
    async fn test_windows_are_contiguous_and_complete() {
        let source = ScriptedSource::default();
        let aggregator = Aggregator::new(
            source,
            settings(PaginationMode::SinglePage, CursorPolicy::Reset),
        );

        aggregator.run(utc(1, 0), utc(2, 1)).await.unwrap();

        let froms: Vec<_> = aggregator.source().calls().iter().map(|(w, _)| w.from).collect();
        assert_eq!(
            froms,
            vec![
                utc(1, 0),
                utc(1, 4),
                utc(1, 8),
                utc(1, 12),
                utc(1, 16),
                utc(1, 20),
                utc(2, 0)
            ]
        );
    }

    #[tokio::test]
    async fn test_month_comes_from_window_start() {
        let source = ScriptedSource::new(vec![Ok(AlertPage::new(vec![alert("ALPHA", 4)], None))]);
        let aggregator = Aggregator::new(
            source,
            settings(PaginationMode::SinglePage, CursorPolicy::Reset),
        );

        let start = utc(31, 22);
        let now = start + chrono::Duration::hours(1);
        let (tally, _) = aggregator.run(start, now).await.unwrap();

        assert_eq!(tally.get("2024-07", "ALPHA").unwrap().event_count, 4);
        assert!(tally.managers("2024-08").is_none());
    }

    #[tokio::test]
    async fn test_drain_follows_cursor_within_window() {
        let source = ScriptedSource::new(vec![
            Ok(AlertPage::new(vec![alert("ALPHA", 1)], cursor(1))),
            Ok(AlertPage::new(vec![alert("ALPHA", 2)], cursor(2))),
            Ok(AlertPage::new(vec![], None)),
            Ok(AlertPage::new(vec![alert("BETA", 3)], None)),
        ]);
        let aggregator = Aggregator::new(
            source,
            settings(PaginationMode::Drain, CursorPolicy::Reset),
        );

        let (tally, stats) = aggregator.run(utc(1, 0), utc(1, 8)).await.unwrap();

        let calls = aggregator.source().calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].1, None);
        assert_eq!(calls[1].1, cursor(1));
        assert_eq!(calls[2].1, cursor(2));
        assert_eq!(calls[2].0, calls[0].0);
        assert_eq!(calls[3].0.from, utc(1, 4));
        assert_eq!(calls[3].1, None);

        assert_eq!(tally.get("2024-07", "ALPHA").unwrap().event_count, 3);
        assert_eq!(tally.get("2024-07", "ALPHA").unwrap().alert_count, 2);
        assert_eq!(stats.pages, 4);
    }

    #[tokio::test]
    async fn test_drain_stops_on_empty_page_with_cursor() {
        let source = ScriptedSource::new(vec![
            Ok(AlertPage::new(vec![alert("ALPHA", 1)], cursor(1))),
            Ok(AlertPage::new(vec![], cursor(1))),
        ]);
        let aggregator = Aggregator::new(
            source,
            settings(PaginationMode::Drain, CursorPolicy::Reset),
        );

        let (_, stats) = aggregator.run(utc(1, 0), utc(1, 4)).await.unwrap();
        assert_eq!(stats.pages, 2);
    }

    #[tokio::test]
    async fn test_drain_respects_page_limit() {
        let source = ScriptedSource::new(
            (1..=5)
                .map(|id| Ok(AlertPage::new(vec![alert("ALPHA", 1)], cursor(id))))
                .collect(),
        );
        let mut run_settings = settings(PaginationMode::Drain, CursorPolicy::Reset);
        run_settings.max_pages_per_window = 3;
        let aggregator = Aggregator::new(source, run_settings);

        let (tally, stats) = aggregator.run(utc(1, 0), utc(1, 4)).await.unwrap();

        assert_eq!(stats.pages, 3);
        assert_eq!(tally.get("2024-07", "ALPHA").unwrap().alert_count, 3);
    }

    #[tokio::test]
    async fn test_single_page_drops_remaining_pages() {
        let source = ScriptedSource::new(vec![
            Ok(AlertPage::new(vec![alert("ALPHA", 1)], cursor(1))),
            Ok(AlertPage::new(vec![alert("BETA", 1)], cursor(2))),
        ]);
        let aggregator = Aggregator::new(
            source,
            settings(PaginationMode::SinglePage, CursorPolicy::Reset),
        );

        aggregator.run(utc(1, 0), utc(1, 8)).await.unwrap();

        let calls = aggregator.source().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0.from, utc(1, 4));
    }

    #[tokio::test]
    async fn test_reset_policy_starts_each_window_without_cursor() {
        let source = ScriptedSource::new(vec![
            Ok(AlertPage::new(vec![alert("ALPHA", 1)], cursor(7))),
            Ok(AlertPage::new(vec![alert("ALPHA", 1)], cursor(9))),
        ]);
        let aggregator = Aggregator::new(
            source,
            settings(PaginationMode::SinglePage, CursorPolicy::Reset),
        );

        aggregator.run(utc(1, 0), utc(1, 12)).await.unwrap();

        let cursors: Vec<_> = aggregator.source().calls().into_iter().map(|(_, c)| c).collect();
        assert_eq!(cursors, vec![None, None, None]);
    }

    #[tokio::test]
    async fn test_carry_policy_threads_cursor_into_next_window() {
        let source = ScriptedSource::new(vec![
            Ok(AlertPage::new(vec![alert("ALPHA", 1)], cursor(7))),
            Ok(AlertPage::new(vec![alert("ALPHA", 1)], None)),
            Ok(AlertPage::new(vec![alert("ALPHA", 1)], cursor(9))),
        ]);
        let aggregator = Aggregator::new(
            source,
            settings(PaginationMode::SinglePage, CursorPolicy::Carry),
        );

        aggregator.run(utc(1, 0), utc(1, 16)).await.unwrap();

        let cursors: Vec<_> = aggregator.source().calls().into_iter().map(|(_, c)| c).collect();
        assert_eq!(cursors, vec![None, cursor(7), None, cursor(9)]);
    }

    #[tokio::test]
    async fn test_empty_window_leaves_month_untouched() {
        let source = ScriptedSource::new(vec![
            Ok(AlertPage::new(vec![alert("ALPHA", 6)], None)),
            Ok(AlertPage::new(vec![], None)),
        ]);
        let aggregator = Aggregator::new(
            source,
            settings(PaginationMode::Drain, CursorPolicy::Reset),
        );

        let (tally, _) = aggregator.run(utc(1, 0), utc(1, 8)).await.unwrap();

        let managers = tally.managers("2024-07").unwrap();
        assert_eq!(managers.len(), 1);
        assert_eq!(managers["ALPHA"].event_count, 6);
    }

    #[tokio::test]
    async fn test_fetch_error_aborts_run() {
        let source = ScriptedSource::new(vec![
            Ok(AlertPage::new(vec![alert("ALPHA", 1)], None)),
            Err(Error::api(503, "unavailable")),
        ]);
        let aggregator = Aggregator::new(
            source,
            settings(PaginationMode::Drain, CursorPolicy::Reset),
        );

        let result = aggregator.run(utc(1, 0), utc(1, 12)).await;

        assert!(matches!(result, Err(Error::Api { status: 503, .. })));
        assert_eq!(aggregator.source().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_unrepresentable_window_end_issues_no_requests() {
        let config = WindowConfig {
            width_hours: u32::MAX,
            delay: Duration::ZERO,
            ..WindowConfig::default()
        };
        let aggregator = Aggregator::new(ScriptedSource::default(), RunSettings::from(&config));

        let (tally, stats) = aggregator.run(utc(1, 0), utc(2, 0)).await.unwrap();

        assert_eq!(stats, RunStats::default());
        assert_eq!(tally.total_alerts(), 0);
        assert!(aggregator.source().calls().is_empty());
    }
}
