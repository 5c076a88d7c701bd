//! Engine configuration.

use std::time::Duration;

/// Default upper bound for `first` and `limit`.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 1000;

/// Default bound on a single backend call.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do when a request asks for more rows than `max_page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSizePolicy {
    /// Fail with `PageSizeExceeded`.
    #[default]
    Reject,
    /// Serve `max_page_size` rows and report the requested size in
    /// `Connection::clamped_from`.
    Clamp,
}

/// Configuration for [`QueryEngine`](crate::QueryEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Largest page a single request may return.
    pub max_page_size: usize,
    /// Handling of oversized page requests.
    pub page_size_policy: PageSizePolicy,
    /// Bound on each backend call; `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            page_size_policy: PageSizePolicy::default(),
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum page size.
    pub fn with_max_page_size(mut self, max: usize) -> Self {
        self.max_page_size = max;
        self
    }

    /// Set the oversized page policy.
    pub fn with_page_size_policy(mut self, policy: PageSizePolicy) -> Self {
        self.page_size_policy = policy;
        self
    }

    /// Set the backend call timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Disable the backend call timeout.
    pub fn without_fetch_timeout(mut self) -> Self {
        self.fetch_timeout = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new();
        assert_eq!(config.max_page_size, 1000);
        assert_eq!(config.page_size_policy, PageSizePolicy::Reject);
        assert_eq!(config.fetch_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .with_max_page_size(50)
            .with_page_size_policy(PageSizePolicy::Clamp)
            .without_fetch_timeout();
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.page_size_policy, PageSizePolicy::Clamp);
        assert!(config.fetch_timeout.is_none());

        let config = EngineConfig::new().with_fetch_timeout(Duration::from_millis(5));
        assert_eq!(config.fetch_timeout, Some(Duration::from_millis(5)));
    }
}
