use std::time::Duration;

/// Timing and validation knobs for the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    pub connect_timeout: Duration,
    /// Delay between reaching 100% and navigating to the result.
    pub navigation_delay: Duration,
    pub max_query_len: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(5),
            navigation_delay: Duration::from_millis(500),
            max_query_len: 500,
        }
    }
}
