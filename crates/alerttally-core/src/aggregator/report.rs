//! Monthly manager report

use std::fmt;

use serde::Serialize;

use super::tally::MonthlyTally;

/// One manager's totals within a month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Manager name
    pub manager: String,
    /// Alerts attributed to the manager
    pub alert_count: u64,
    /// Events folded into those alerts
    pub event_count: u64,
}

/// Rows of one month, busiest manager first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSection {
    /// Month as `YYYY-MM`
    pub month: String,
    /// Rows sorted by event count, descending
    pub managers: Vec<ReportRow>,
}

impl MonthSection {
    /// Events across all managers of the month
    pub fn total_events(&self) -> u64 {
        self.managers.iter().map(|row| row.event_count).sum()
    }
}

/// Final report, months in chronological order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyReport {
    /// Sections per month
    pub months: Vec<MonthSection>,
}

impl MonthlyReport {
    /// Build the report from a finished tally
    pub fn from_tally(tally: &MonthlyTally) -> Self {
        let months = tally
            .iter()
            .map(|(month, managers)| {
                let mut rows: Vec<ReportRow> = managers
                    .iter()
                    .map(|(manager, counts)| ReportRow {
                        manager: manager.clone(),
                        alert_count: counts.alert_count,
                        event_count: counts.event_count,
                    })
                    .collect();
                // Stable: ties keep manager name order
                rows.sort_by(|a, b| b.event_count.cmp(&a.event_count));

                MonthSection {
                    month: month.to_string(),
                    managers: rows,
                }
            })
            .collect();

        Self { months }
    }

    /// Section for `month`, if it was processed
    pub fn month(&self, month: &str) -> Option<&MonthSection> {
        self.months.iter().find(|section| section.month == month)
    }
}

impl fmt::Display for MonthlyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Manager level monthly event counts:")?;
        for section in &self.months {
            writeln!(f)?;
            writeln!(f, "Month: {}", section.month)?;
            if section.managers.is_empty() {
                writeln!(f, "  No events recorded for this month.")?;
                continue;
            }
            for row in &section.managers {
                writeln!(
                    f,
                    "  Manager: {}, Total Alerts: {}, Total Events: {}",
                    row.manager, row.alert_count, row.event_count
                )?;
            }
        }
        Ok(())
    }
}
