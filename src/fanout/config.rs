//! Fanout configuration

use std::time::Duration;

/// Default minimum interval between broadcast ticks
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Default bound on a single client's frame write
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Shortest accepted tick period; a zero period cannot drive a timer
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

/// Broadcast loop configuration
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Minimum interval between frame acquisitions
    pub frame_interval: Duration,

    /// Upper bound on writing one frame to one client
    ///
    /// The effective bound is never longer than `frame_interval`; see
    /// [`FanoutConfig::client_budget`].
    pub write_timeout: Duration,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            frame_interval: DEFAULT_FRAME_INTERVAL,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl FanoutConfig {
    /// Set the frame interval, clamped to [`MIN_FRAME_INTERVAL`]
    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval.max(MIN_FRAME_INTERVAL);
        self
    }

    /// Set the per-client write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Cap the frame rate; 0 leaves the interval unchanged
    pub fn max_fps(mut self, fps: u32) -> Self {
        if fps > 0 {
            self.frame_interval = (Duration::from_secs(1) / fps).max(MIN_FRAME_INTERVAL);
        }
        self
    }

    /// Time a client gets to take one frame before it is dropped
    ///
    /// A client that cannot keep up with the frame rate is cut loose rather
    /// than slowing every other client down.
    pub fn client_budget(&self) -> Duration {
        self.write_timeout.min(self.tick_period())
    }

    /// `frame_interval`, never below [`MIN_FRAME_INTERVAL`]
    pub fn tick_period(&self) -> Duration {
        self.frame_interval.max(MIN_FRAME_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FanoutConfig::default();
        assert_eq!(config.frame_interval, Duration::from_millis(50));
        assert_eq!(config.write_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_max_fps() {
        let config = FanoutConfig::default().max_fps(5);
        assert_eq!(config.frame_interval, Duration::from_millis(200));

        let config = FanoutConfig::default().max_fps(0);
        assert_eq!(config.frame_interval, DEFAULT_FRAME_INTERVAL);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = FanoutConfig::default().frame_interval(Duration::ZERO);
        assert_eq!(config.frame_interval, MIN_FRAME_INTERVAL);

        let config = FanoutConfig::default().max_fps(2_000_000_000);
        assert_eq!(config.frame_interval, MIN_FRAME_INTERVAL);

        let mut config = FanoutConfig::default();
        config.frame_interval = Duration::ZERO;
        assert_eq!(config.tick_period(), MIN_FRAME_INTERVAL);
    }

    #[test]
    fn test_client_budget() {
        let config = FanoutConfig::default();
        assert_eq!(config.client_budget(), Duration::from_millis(50));

        let config = FanoutConfig::default()
            .frame_interval(Duration::from_secs(1))
            .write_timeout(Duration::from_millis(300));
        assert_eq!(config.client_budget(), Duration::from_millis(300));
    }

    #[test]
    fn test_builder_chaining() {
        let config = FanoutConfig::default()
            .frame_interval(Duration::from_millis(100))
            .write_timeout(Duration::from_secs(1));

        assert_eq!(config.frame_interval, Duration::from_millis(100));
        assert_eq!(config.write_timeout, Duration::from_secs(1));
    }
}
