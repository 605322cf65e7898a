//! Real-time transport configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Upper bound on the per-connection outbound queue.
pub const MAX_OUTBOUND_BUFFER: usize = 65_536;

/// Socket layer timers and queue sizing
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Seconds between heartbeat pings
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    /// Seconds between presence stats log lines
    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,

    /// Frames queued per connection before new ones are dropped
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl RealtimeConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }

    /// Validate real-time configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.heartbeat_interval_secs == 0 {
            return Err(ValidationError::InvalidInterval("heartbeat_interval_secs"));
        }
        if self.stats_interval_secs == 0 {
            return Err(ValidationError::InvalidInterval("stats_interval_secs"));
        }
        if self.outbound_buffer == 0 || self.outbound_buffer > MAX_OUTBOUND_BUFFER {
            return Err(ValidationError::InvalidOutboundBuffer(MAX_OUTBOUND_BUFFER));
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval(),
            stats_interval_secs: default_stats_interval(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_stats_interval() -> u64 {
    60
}

fn default_outbound_buffer() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_defaults() {
        let config = RealtimeConfig::default();
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(config.stats_interval(), Duration::from_secs(60));
        assert_eq!(config.outbound_buffer, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let config = RealtimeConfig {
            heartbeat_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidInterval("heartbeat_interval_secs"))
        );

        let config = RealtimeConfig {
            stats_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_outbound_buffer_bounds() {
        let config = RealtimeConfig {
            outbound_buffer: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RealtimeConfig {
            outbound_buffer: MAX_OUTBOUND_BUFFER + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
