//! LRU store configuration.

use std::time::Duration;

/// Configuration for an [`LruStore`](super::LruStore).
///
/// ```rust
/// # use muninn::lru::LruConfig;
/// # use std::time::Duration;
/// let config = LruConfig::new()
///     .max_items(10_000)
///     .time_to_live(Duration::from_secs(300))
///     .sliding_expiration(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LruConfig {
    /// Maximum number of live items. `None` = unbounded. Default: `None`.
    pub max_items: Option<usize>,
    /// Store-wide time-to-live. Default: 60s.
    pub time_to_live: Duration,
    /// Push the deadline forward on every touch. Default: true.
    pub sliding_expiration: bool,
    /// Minimum time between lazy sweeps triggered by inserts. Default: 60s.
    pub sweep_interval: Duration,
}

impl Default for LruConfig {
    fn default() -> Self {
        Self {
            max_items: None,
            time_to_live: Duration::from_secs(60),
            sliding_expiration: true,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl LruConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of live items.
    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }

    /// Remove the item cap.
    pub fn unbounded(mut self) -> Self {
        self.max_items = None;
        self
    }

    /// Set the store-wide time-to-live.
    pub fn time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = ttl;
        self
    }

    /// Enable or disable sliding expiration.
    pub fn sliding_expiration(mut self, enabled: bool) -> Self {
        self.sliding_expiration = enabled;
        self
    }

    /// Set the lazy sweep interval.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LruConfig::default();
        assert_eq!(config.max_items, None);
        assert_eq!(config.time_to_live, Duration::from_secs(60));
        assert!(config.sliding_expiration);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn builder_pattern() {
        let config = LruConfig::new()
            .max_items(5)
            .time_to_live(Duration::from_millis(50))
            .sliding_expiration(false)
            .sweep_interval(Duration::from_secs(1));
        assert_eq!(config.max_items, Some(5));
        assert_eq!(config.time_to_live, Duration::from_millis(50));
        assert!(!config.sliding_expiration);
        assert_eq!(config.unbounded().max_items, None);
    }
}
