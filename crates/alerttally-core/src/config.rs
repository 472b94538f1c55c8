//! Configuration management for alerttally
//!
//! Values are layered: built-in defaults, an optional config file, `.env`
//! and `ALERTTALLY_*` environment variables. CLI flags are applied on top
//! through [`Overrides`].

use std::path::Path;
use std::time::Duration;

use config::{Config as ConfigSource, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Prefix for environment overrides, e.g. `ALERTTALLY_API__API_KEY`
pub const ENV_PREFIX: &str = "ALERTTALLY";

/// Largest accepted `window.lookback_days` (about a century)
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

/// Largest accepted `window.width_hours` (one year)
pub const MAX_WINDOW_HOURS: u32 = 8_760;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Alert search API configuration
    pub api: ApiConfig,

    /// Time window and pagination configuration
    pub window: WindowConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // A missing .env file is not an error
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), "Loaded .env file");
        }

        Self::build(path, environment())
    }

    fn build(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder =
            ConfigSource::builder().add_source(ConfigSource::try_from(&Self::default())?);

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder.add_source(env).build()?.try_deserialize()?;

        Ok(config)
    }

    /// Check that the configuration can drive a run
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.trim().is_empty() {
            return Err(Error::config(format!(
                "api.api_key is required (set {ENV_PREFIX}_API__API_KEY)"
            )));
        }
        url::Url::parse(&self.api.url)?;
        if self.api.page_limit == 0 {
            return Err(Error::config("api.page_limit must be greater than zero"));
        }
        if self.window.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(Error::config(format!(
                "window.lookback_days must be at most {MAX_LOOKBACK_DAYS}"
            )));
        }
        if self.window.width_hours == 0 {
            return Err(Error::config("window.width_hours must be greater than zero"));
        }
        if self.window.width_hours > MAX_WINDOW_HOURS {
            return Err(Error::config(format!(
                "window.width_hours must be at most {MAX_WINDOW_HOURS}"
            )));
        }
        if self.window.max_pages_per_window == 0 {
            return Err(Error::config(
                "window.max_pages_per_window must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

/// Command line values applied on top of the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Replaces `window.lookback_days`
    pub lookback_days: Option<u32>,
    /// Replaces `window.width_hours`
    pub width_hours: Option<u32>,
    /// Replaces `window.delay`
    pub delay: Option<Duration>,
    /// Replaces `window.pagination`
    pub pagination: Option<PaginationMode>,
    /// Replaces `window.cursor`
    pub cursor: Option<CursorPolicy>,
    /// Forces one page per window and a carried cursor
    pub legacy: bool,
    /// Turns on `api.dump_responses`
    pub dump_responses: bool,
}

impl Overrides {
    /// Write every value that was given into `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(days) = self.lookback_days {
            config.window.lookback_days = days;
        }
        if let Some(hours) = self.width_hours {
            config.window.width_hours = hours;
        }
        if let Some(delay) = self.delay {
            config.window.delay = delay;
        }
        if let Some(pagination) = self.pagination {
            config.window.pagination = pagination;
        }
        if let Some(cursor) = self.cursor {
            config.window.cursor = cursor;
        }
        if self.legacy {
            config.window.pagination = PaginationMode::SinglePage;
            config.window.cursor = CursorPolicy::Carry;
        }
        if self.dump_responses {
            config.api.dump_responses = true;
        }
    }
}

/// Alert search API configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Alert search endpoint
    pub url: String,
    /// Static credential sent in the `apiKey` header
    pub api_key: String,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Maximum number of alerts per page
    pub page_limit: u32,
    /// Log every raw response at info level instead of debug
    pub dump_responses: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "https://api.moogsoft.ai/v1/alerts".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
            page_limit: 4000,
            dump_responses: false,
        }
    }
}

// Keeps the credential out of logs.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("page_limit", &self.page_limit)
            .field("dump_responses", &self.dump_responses)
            .finish()
    }
}

/// How many pages are requested for a single window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Follow the cursor until the window is exhausted
    #[default]
    Drain,
    /// Fetch one page per window and move on
    SinglePage,
}

/// What happens to the cursor when the next window starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CursorPolicy {
    /// Every window starts without a cursor
    #[default]
    Reset,
    /// The last cursor of a window is sent with the next window's first request
    Carry,
}

/// Time window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Days subtracted from the first day of the current month
    pub lookback_days: u32,
    /// Width of each query window in hours
    pub width_hours: u32,
    /// Pause after every request
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    /// Pages requested per window
    pub pagination: PaginationMode,
    /// Cursor handling across windows
    pub cursor: CursorPolicy,
    /// Upper bound on pages drained from one window
    pub max_pages_per_window: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            width_hours: 4,
            delay: Duration::from_millis(500),
            pagination: PaginationMode::default(),
            cursor: CursorPolicy::default(),
            max_pages_per_window: 1000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
