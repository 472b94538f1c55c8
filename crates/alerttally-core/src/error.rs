//! Error types for alerttally

use thiserror::Error;

/// Result type alias using alerttally's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for alerttally operations
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be sent or the response could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The alert search API answered with a non-success status
    #[error("Alert API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body was not valid JSON
    #[error("Malformed response for window {window}: {source}")]
    MalformedResponse {
        window: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration source could not be read or merged
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// Endpoint URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an API status error
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }
}
