use std::time::Duration;

use url::Url;

use crate::error::AppError;
use crate::models::GenreId;
use crate::throttle::{MAX_DELAY, ThrottleConfig};

pub const DEFAULT_BASE_URL: &str = "https://musicbrainz.org/genre/";
pub const DEFAULT_USER_AGENT: &str = concat!(
    "genremap/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/genremap/genremap)"
);
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for one scrape run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Genre page URL prefix; the genre id is appended verbatim.
    pub base_url: String,
    /// Sent with every request so the service can identify the client.
    pub user_agent: String,
    /// Minimum gap between request starts.
    pub delay: Duration,
    pub jitter: Duration,
    pub timeout: Duration,
    /// Number of genres fetched and parsed at once.
    pub concurrency: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            delay: DEFAULT_DELAY,
            jitter: Duration::ZERO,
            timeout: DEFAULT_TIMEOUT,
            concurrency: 1,
        }
    }
}

impl ScrapeConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Check that the configuration can drive a run.
    pub fn validate(&self) -> Result<(), AppError> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            AppError::ConfigError(format!("Invalid base URL '{}': {e}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::ConfigError(format!(
                "Base URL scheme '{}' is not allowed (only http/https)",
                url.scheme()
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(AppError::ConfigError("User agent must not be empty".into()));
        }
        if self.timeout.is_zero() {
            return Err(AppError::ConfigError(
                "Request timeout must be greater than zero".into(),
            ));
        }
        if self.delay.saturating_add(self.jitter) > MAX_DELAY {
            return Err(AppError::ConfigError(format!(
                "Delay plus jitter must not exceed {} seconds",
                MAX_DELAY.as_secs()
            )));
        }
        if self.concurrency == 0 {
            return Err(AppError::ConfigError(
                "Concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// URL of one genre's page.
    pub fn page_url(&self, id: &GenreId) -> String {
        format!("{}{}", self.base_url, id)
    }

    pub fn throttle(&self) -> ThrottleConfig {
        ThrottleConfig::new(self.delay).with_jitter(self.jitter)
    }
}

/// Convert a user-supplied number of seconds into a [`Duration`].
///
/// Rejects negative, NaN and infinite values.
pub fn seconds(value: f64, what: &str) -> Result<Duration, AppError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        AppError::ConfigError(format!(
            "Invalid {what} '{value}': must be a finite number of seconds >= 0"
        ))
    })
}
