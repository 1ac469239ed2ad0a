use chrono::{DateTime, FixedOffset, TimeDelta};
use tracing::debug;

use crate::config::settings::RateLimitConfig;
use crate::models::profile::IpProfile;

/// Sliding-window request counter over a profile's recorded timestamps.
///
/// The window ends at an evaluation instant supplied by the caller, which is
/// the latest log timestamp for offline analysis or wall-clock time.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    window: TimeDelta,
    max_requests: usize,
}

impl SlidingWindow {
    pub fn new(window_secs: u64, max_requests: usize) -> Self {
        let secs = i64::try_from(window_secs).unwrap_or(i64::MAX);
        let window = TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX);
        Self { window, max_requests }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.window_secs, config.max_requests)
    }

    /// Timestamps with `now - t <= window`.
    pub fn count(&self, times: &[DateTime<FixedOffset>], now: DateTime<FixedOffset>) -> usize {
        times
            .iter()
            .filter(|t| now.signed_duration_since(**t) <= self.window)
            .count()
    }

    pub fn is_exceeded(&self, times: &[DateTime<FixedOffset>], now: DateTime<FixedOffset>) -> bool {
        self.count(times, now) >= self.max_requests
    }

    /// Set `is_limit_exceeded` on the profile.
    pub fn apply(&self, profile: &mut IpProfile, now: DateTime<FixedOffset>) {
        profile.is_limit_exceeded = self.is_exceeded(&profile.request_times, now);
        if profile.is_limit_exceeded {
            debug!(
                ip = %profile.address,
                window_secs = self.window.num_seconds(),
                max_requests = self.max_requests,
                "Rate limit exceeded"
            );
        }
    }
}
