//! Monthly per-manager accumulator

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::AlertRecord;

/// Running counts for one (month, manager) pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ManagerCounts {
    /// Sum of `event_count` over folded alerts
    pub event_count: u64,
    /// Number of folded alerts
    pub alert_count: u64,
}

impl ManagerCounts {
    /// Fold one alert carrying `events` raw events
    pub fn record(&mut self, events: u64) {
        self.event_count = self.event_count.saturating_add(events);
        self.alert_count = self.alert_count.saturating_add(1);
    }
}

/// Counts keyed by month (`YYYY-MM`) then manager
///
/// Month keys sort lexically in chronological order, so iteration follows the
/// order in which windows were processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlyTally {
    months: BTreeMap<String, BTreeMap<String, ManagerCounts>>,
}

impl MonthlyTally {
    /// Create an empty tally
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a month so it appears in the report even without alerts
    pub fn open_month(&mut self, month: &str) -> &mut BTreeMap<String, ManagerCounts> {
        self.months.entry(month.to_string()).or_default()
    }

    /// Fold a single alert into `month`
    pub fn fold(&mut self, month: &str, record: &AlertRecord) {
        self.open_month(month)
            .entry(record.manager_or_unknown().to_string())
            .or_default()
            .record(record.events());
    }

    /// Fold every alert of a page into `month`
    pub fn fold_page(&mut self, month: &str, records: &[AlertRecord]) {
        self.open_month(month);
        for record in records {
            self.fold(month, record);
        }
    }

    /// Counts for a (month, manager) pair
    pub fn get(&self, month: &str, manager: &str) -> Option<&ManagerCounts> {
        self.months.get(month)?.get(manager)
    }

    /// Managers recorded for `month`
    pub fn managers(&self, month: &str) -> Option<&BTreeMap<String, ManagerCounts>> {
        self.months.get(month)
    }

    /// Months in chronological order with their managers
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, ManagerCounts>)> {
        self.months.iter().map(|(month, managers)| (month.as_str(), managers))
    }

    /// Total alerts folded across all months
    pub fn total_alerts(&self) -> u64 {
        self.months
            .values()
            .flat_map(BTreeMap::values)
            .map(|counts| counts.alert_count)
            .sum()
    }
}
