//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for the sync engine's loops and HTTP endpoint.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the remote API. `None` disables sync entirely.
    pub base_url: Option<String>,
    /// Interval between push cycles.
    pub push_interval: Duration,
    /// Interval between pull cycles.
    pub pull_interval: Duration,
    /// Page size for pull requests.
    pub pull_limit: u32,
    /// Request timeout for the shipped HTTP client.
    pub timeout: Duration,
}

impl SyncConfig {
    /// Creates a configuration for the given base URL with default
    /// intervals (push every 5s, pull every 10s, 200 changes per page).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            push_interval: Duration::from_secs(5),
            pull_interval: Duration::from_secs(10),
            pull_limit: 200,
            timeout: Duration::from_secs(30),
        }
    }

    /// Creates a configuration with sync disabled.
    ///
    /// An engine built from it runs local-only: `start` is a no-op.
    pub fn disabled() -> Self {
        Self {
            base_url: None,
            ..Self::new("")
        }
    }

    /// Sets the push interval.
    #[must_use]
    pub fn with_push_interval(mut self, interval: Duration) -> Self {
        self.push_interval = interval;
        self
    }

    /// Sets the pull interval.
    #[must_use]
    pub fn with_pull_interval(mut self, interval: Duration) -> Self {
        self.pull_interval = interval;
        self
    }

    /// Sets the pull page size.
    #[must_use]
    pub fn with_pull_limit(mut self, limit: u32) -> Self {
        self.pull_limit = limit;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns true when a non-empty base URL is configured.
    pub fn has_endpoint(&self) -> bool {
        self.base_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let config = SyncConfig::new("https://api.example.com")
            .with_push_interval(Duration::from_secs(1))
            .with_pull_interval(Duration::from_secs(2))
            .with_pull_limit(50)
            .with_timeout(Duration::from_secs(10));

        assert_eq!(config.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.push_interval, Duration::from_secs(1));
        assert_eq!(config.pull_interval, Duration::from_secs(2));
        assert_eq!(config.pull_limit, 50);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.has_endpoint());
    }

    #[test]
    fn disabled_has_no_endpoint() {
        assert!(!SyncConfig::disabled().has_endpoint());
        assert!(!SyncConfig::default().has_endpoint());
        assert!(!SyncConfig::new("").has_endpoint());
    }
}
