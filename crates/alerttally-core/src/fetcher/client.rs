//! HTTP client for the alert search endpoint

use reqwest::Client;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::models::{AlertPage, Cursor, SearchRequest, SearchResponse, TimeWindow};

use super::AlertSource;

/// Header carrying the static credential
const API_KEY_HEADER: &str = "apiKey";

/// Fetches alert pages over HTTP
pub struct HttpAlertSource {
    client: Client,
    url: String,
    api_key: String,
    page_limit: u32,
    dump_responses: bool,
}

impl HttpAlertSource {
    /// Create a new source from the API configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let url = url::Url::parse(&config.url)?;
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
            api_key: config.api_key.clone(),
            page_limit: config.page_limit,
            dump_responses: config.dump_responses,
        })
    }

    /// Endpoint this source posts to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether raw responses are logged at info level
    pub fn dumps_responses(&self) -> bool {
        self.dump_responses
    }
}

#[async_trait::async_trait]
impl AlertSource for HttpAlertSource {
    async fn fetch_page(&self, window: &TimeWindow, cursor: Option<&Cursor>) -> Result<AlertPage> {
        let request = SearchRequest::for_window(window, cursor, self.page_limit);

        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(Error::api(
                status.as_u16(),
                String::from_utf8_lossy(&body).into_owned(),
            ));
        }

        let raw: serde_json::Value =
            serde_json::from_slice(&body).map_err(|source| Error::MalformedResponse {
                window: window.to_string(),
                source,
            })?;

        info!(from = %window.date_from(), to = %window.date_to(), "Received alert page");
        if self.dump_responses {
            let pretty = serde_json::to_string_pretty(&raw)?;
            info!(
                "Response for {} to {}:\n{}",
                window.date_from(),
                window.date_to(),
                pretty
            );
        } else if tracing::enabled!(tracing::Level::DEBUG) {
            let pretty = serde_json::to_string_pretty(&raw)?;
            debug!(
                "Response for {} to {}:\n{}",
                window.date_from(),
                window.date_to(),
                pretty
            );
        }

        let response: SearchResponse = serde_json::from_value(raw)?;
        Ok(response.into())
    }
}
