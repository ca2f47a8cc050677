use std::time::{Duration, Instant};

use crate::constants::{MIN_RESEND_INTERVAL, RESEND_LATENCY_FACTOR};

/// Decides when an unacknowledged packet is considered lost
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResendPolicy {
    /// Lower bound of the timeout, whatever the latency
    pub min_interval: Duration,
    /// The timeout grows to this multiple of the measured latency
    pub latency_factor: f32,
}

impl ResendPolicy {
    /// Timeout for a connection with the given latency:
    /// `max(min_interval, latency_factor * latency)`
    pub fn timeout(&self, latency: Duration) -> Duration {
        self.min_interval.max(latency.mul_f32(self.latency_factor.max(0.0)))
    }

    /// A packet sent at `time_sent` is lost once strictly more than
    /// `timeout(latency)` has passed
    pub fn is_expired(&self, time_sent: &Instant, now: &Instant, latency: Duration) -> bool {
        now.saturating_duration_since(*time_sent) > self.timeout(latency)
    }
}

impl Default for ResendPolicy {
    fn default() -> Self {
        Self {
            min_interval: MIN_RESEND_INTERVAL,
            latency_factor: RESEND_LATENCY_FACTOR,
        }
    }
}
