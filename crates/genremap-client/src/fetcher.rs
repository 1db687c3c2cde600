use std::time::Duration;

use genremap_core::config::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ScrapeConfig};
use genremap_core::error::AppError;
use genremap_core::traits::Fetcher;
use reqwest::Client;

/// HTTP fetcher using reqwest.
///
/// Downloads raw HTML with an identifying User-Agent and a per-request
/// timeout. Pacing is handled by the caller's throttle.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout: Duration,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::build(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }

    pub fn from_config(config: &ScrapeConfig) -> Result<Self, AppError> {
        Self::build(&config.user_agent, config.timeout)
    }

    pub fn build(user_agent: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self { client, timeout })
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout)
            } else {
                AppError::HttpError(format!("Failed to read response body: {e}"))
            }
        })
    }
}
