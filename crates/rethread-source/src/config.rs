use serde::{Deserialize, Serialize};
use std::time::Duration;

const PULLPUSH_API_BASE: &str = "https://api.pullpush.io/reddit/search";

/// Settings for the PullPush archive client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullPushConfig {
    pub base_url: String,
    /// Items requested per page
    pub batch_size: u32,
    /// Pause between consecutive requests
    pub rate_limit: Duration,
    pub request_timeout: Duration,
    /// Extra attempts after the first failed request
    pub max_retries: u32,
    /// First retry wait; doubles on every further attempt
    pub retry_base_delay: Duration,
}

impl Default for PullPushConfig {
    fn default() -> Self {
        Self {
            base_url: PULLPUSH_API_BASE.to_string(),
            batch_size: 100,
            rate_limit: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(2),
        }
    }
}

impl PullPushConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_rate_limit(mut self, delay: Duration) -> Self {
        self.rate_limit = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    /// Wait before retry number `attempt` (1-based), capped at ten seconds
    pub(crate) fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_base_delay
            .saturating_mul(factor)
            .min(Duration::from_secs(10))
    }
}
