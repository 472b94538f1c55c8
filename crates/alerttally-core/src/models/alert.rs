//! Alert data models
//!
//! Shapes returned by the alert search API. Every field is optional on the
//! wire; defaults are applied when the records are folded.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Manager attributed to alerts that carry none
pub const UNKNOWN_MANAGER: &str = "Unknown";

/// Identifier of an alert, numeric on most deployments
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertId {
    /// Numeric identifier
    Numeric(u64),
    /// Textual identifier
    Text(String),
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// A single alert as returned by the search endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Ingress source that raised the alert
    #[serde(default)]
    pub manager: Option<String>,

    /// Alert identifier, used as the sort key
    #[serde(default)]
    pub alert_id: Option<AlertId>,

    /// Number of raw events deduplicated into this alert
    #[serde(default)]
    pub event_count: Option<u64>,
}

impl AlertRecord {
    /// Manager name, or `"Unknown"` when absent
    pub fn manager_or_unknown(&self) -> &str {
        self.manager.as_deref().unwrap_or(UNKNOWN_MANAGER)
    }

    /// Event count, or zero when absent
    pub fn events(&self) -> u64 {
        self.event_count.unwrap_or(0)
    }
}

/// Opaque continuation token (`search_after`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub serde_json::Value);

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw response body of the search endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    /// Result envelope
    #[serde(default)]
    pub data: Option<SearchData>,
}

/// `data` envelope of a search response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchData {
    /// Alerts in this page
    #[serde(default)]
    pub result: Option<Vec<AlertRecord>>,

    /// Cursor for the next page; `null` means no further pages
    #[serde(default)]
    pub search_after: Option<Cursor>,
}

/// One page of alerts with its continuation cursor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertPage {
    /// Alerts in this page
    pub records: Vec<AlertRecord>,
    /// Cursor to continue from, if any
    pub next_cursor: Option<Cursor>,
}

impl AlertPage {
    /// Create a page
    pub fn new(records: Vec<AlertRecord>, next_cursor: Option<Cursor>) -> Self {
        Self {
            records,
            next_cursor,
        }
    }

    /// Whether the page carries no alerts
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<SearchResponse> for AlertPage {
    fn from(response: SearchResponse) -> Self {
        let data = response.data.unwrap_or_default();
        Self {
            records: data.result.unwrap_or_default(),
            next_cursor: data.search_after,
        }
    }
}
