use std::time::Duration;

/// Page that carries the `server_status` indicator.
pub const DEFAULT_STATUS_URL: &str = "https://maplelegends.com/";

/// Time between status checks once the monitor is running.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Upper bound on a single page fetch, connect through body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a status monitor instance.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Page fetched on every poll.
    pub url: String,
    /// Fixed wait between polls. No jitter, no backoff.
    pub poll_interval: Duration,
    /// HTTP timeout applied to every outbound request.
    pub request_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_STATUS_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl MonitorConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
