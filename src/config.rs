use std::env;
use std::time::Duration;

use crate::retry::{Backoff, RetryPolicy};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model_id: Option<String>,
    pub request_timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for StudioConfig {
    fn default() -> Self {
        StudioConfig {
            api_key: None,
            base_url: None,
            model_id: None,
            request_timeout: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl StudioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `GEMINI_API_KEY` (or `GOOGLE_API_KEY`), `STUDIO_MODEL`,
    /// `STUDIO_BASE_URL`, `STUDIO_TIMEOUT_SECS`, `STUDIO_MAX_ATTEMPTS`,
    /// `STUDIO_RETRY_DELAY_MS` and `STUDIO_BACKOFF` (`linear` | `exponential`).
    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("GOOGLE_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let base_url = env::var("STUDIO_BASE_URL").ok();
        let model_id = env::var("STUDIO_MODEL").ok();
        let request_timeout = env::var("STUDIO_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs);

        let mut retry = RetryPolicy::default();
        if let Some(attempts) = env::var("STUDIO_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            retry = retry.with_max_attempts(attempts);
        }
        if let Some(delay) = env::var("STUDIO_RETRY_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            retry = retry.with_base_delay(Duration::from_millis(delay));
        }
        if let Ok(backoff) = env::var("STUDIO_BACKOFF") {
            match backoff.to_lowercase().as_str() {
                "exponential" => retry = retry.with_backoff(Backoff::Exponential),
                "linear" => retry = retry.with_backoff(Backoff::Linear),
                other => log::warn!("Ignoring unknown STUDIO_BACKOFF value: {}", other),
            }
        }

        StudioConfig {
            api_key,
            base_url,
            model_id,
            request_timeout,
            retry,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn model(&self) -> &str {
        self.model_id.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL)
    }
}
