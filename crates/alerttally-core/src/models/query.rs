//! Request body for the alert search endpoint
//!
//! The filter follows the AG-Grid JSON filter layout the search UI produces.

use serde::Serialize;

use super::alert::Cursor;
use super::window::TimeWindow;

/// Fields requested for every alert
pub const ALERT_FIELDS: [&str; 3] = ["manager", "alert_id", "event_count"];

/// Offset applied by the API to filter timestamps
pub const UTC_OFFSET: &str = "GMT-0";

/// Search request for one page of alerts
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest<'a> {
    /// Column filters, only `created_at` is used
    pub json_filter: JsonFilter,
    /// Sort order, ascending by alert id
    pub json_sort: Vec<SortSpec>,
    /// Offset the API applies to the filter timestamps
    pub utc_offset: &'static str,
    /// Maximum alerts in the page
    pub limit: u32,
    /// Fields returned for each alert
    pub fields: [&'static str; 3],
    /// Serialized as `null` on the first request
    pub search_after: Option<&'a Cursor>,
}

impl<'a> SearchRequest<'a> {
    /// Alerts created within `window`, ascending by id, continuing after `cursor`
    pub fn for_window(window: &TimeWindow, cursor: Option<&'a Cursor>, limit: u32) -> Self {
        Self {
            json_filter: JsonFilter {
                created_at: DateRangeFilter::in_range(window),
            },
            json_sort: vec![SortSpec {
                sort: "asc",
                col_id: "alert_id",
            }],
            utc_offset: UTC_OFFSET,
            limit,
            fields: ALERT_FIELDS,
            search_after: cursor,
        }
    }
}

/// Column filters keyed by column name
#[derive(Debug, Clone, Serialize)]
pub struct JsonFilter {
    /// Alert creation time
    pub created_at: DateRangeFilter,
}

/// Date filter on a single column
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeFilter {
    /// Inclusive lower bound
    pub date_from: String,
    /// Exclusive upper bound
    pub date_to: String,
    /// Always `date`
    pub filter_type: &'static str,
    /// Always `inRange`
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl DateRangeFilter {
    fn in_range(window: &TimeWindow) -> Self {
        Self {
            date_from: window.date_from(),
            date_to: window.date_to(),
            filter_type: "date",
            kind: "inRange",
        }
    }
}

/// Sort order on a single column
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    /// `asc` or `desc`
    pub sort: &'static str,
    /// Column sorted on
    pub col_id: &'static str,
}
