//! Per-endpoint health bookkeeping.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::EndpointStatus;

/// Health state tracked for a single configured endpoint.
#[derive(Debug, Clone, Copy)]
pub struct EndpointHealth {
    /// Current classification.
    pub status: EndpointStatus,
    /// Consecutive failures since the last success.
    pub fail_count: u32,
    /// Time of the most recent failure, if any.
    pub last_error_time: Option<DateTime<Utc>>,
    /// Time of the most recent success, if any.
    pub last_success_time: Option<DateTime<Utc>>,
    /// Earliest time this endpoint may be tried again.
    pub next_available_time: Option<DateTime<Utc>>,
}

impl EndpointHealth {
    /// A freshly configured endpoint: healthy, never tried.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: EndpointStatus::Healthy,
            fail_count: 0,
            last_error_time: None,
            last_success_time: None,
            next_available_time: None,
        }
    }

    /// Whether this endpoint is eligible to be tried right now.
    #[must_use]
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        if self.status.is_down() {
            return false;
        }
        self.next_available_time.is_none_or(|t| t <= now)
    }

    /// Record a successful probe/connection, resetting failure state.
    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.status = EndpointStatus::Healthy;
        self.fail_count = 0;
        self.last_success_time = Some(now);
        self.next_available_time = None;
    }

    /// Record a failed probe/connection, bumping the exponential backoff cooldown.
    pub fn record_failure(&mut self, now: DateTime<Utc>, base_delay: Duration, max_cooldown: Duration) {
        self.fail_count += 1;
        self.last_error_time = Some(now);

        let cooldown = base_delay
            .checked_mul(1u32.checked_shl(self.fail_count).unwrap_or(u32::MAX))
            .unwrap_or(max_cooldown)
            .min(max_cooldown);

        self.next_available_time = Some(now + chrono::Duration::from_std(cooldown).unwrap_or_default());
        self.status = EndpointStatus::from_fail_count(self.fail_count);
    }

    /// Reset the failure count without touching status/cooldown timing.
    ///
    /// Used to clear stale degradation on an endpoint that is currently the
    /// active connection and has been serving requests successfully, even
    /// though no background probe ever runs against the active endpoint.
    pub fn reset_fail_count_if_recently_successful(&mut self, now: DateTime<Utc>, since: DateTime<Utc>) {
        if self.last_success_time.is_some_and(|t| t >= since) {
            self.fail_count = 0;
            self.status = EndpointStatus::Healthy;
            self.next_available_time = None;
        }
        let _ = now;
    }
}

impl Default for EndpointHealth {
    fn default() -> Self {
        Self::new()
    }
}
