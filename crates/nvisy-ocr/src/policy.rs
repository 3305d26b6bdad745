//! Inter-poll delay and termination policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay between status polls of the reference client.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(50);

/// Upper bound for the exponential backoff.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(2);

/// Default time budget for a job to leave the running state.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(300);

/// Controls how often a running job is polled and when to give up on it.
///
/// The delay after poll `n` (zero-based) is
/// `initial_delay * multiplier^n`, capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Delay after the first `Running` response.
    pub initial_delay: Duration,
    /// Maximum delay between polls.
    pub max_delay: Duration,
    /// Backoff multiplier, `1.0` for a fixed interval.
    pub multiplier: f64,
    /// Maximum number of status requests, `None` for no limit.
    pub max_attempts: Option<u32>,
    /// Time budget measured from the first status request, `None` for no limit.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: 2.0,
            max_attempts: None,
            deadline: Some(DEFAULT_DEADLINE),
        }
    }
}

impl PollPolicy {
    /// Polls at a fixed interval, keeping the default deadline.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1.0,
            ..Self::default()
        }
    }

    /// Polls at the reference interval until the service reports a terminal
    /// state, without any attempt or time limit.
    ///
    /// Only suitable when the service is known to always terminate jobs.
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            deadline: None,
            ..Self::fixed(DEFAULT_INITIAL_DELAY)
        }
    }

    /// Set the maximum number of status requests.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set the polling deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the maximum backoff duration.
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set the backoff multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Calculate the delay after the given zero-based poll attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let millis = (self.initial_delay.as_millis() as f64) * self.multiplier.powi(exponent);
        if !millis.is_finite() || millis >= self.max_delay.as_millis() as f64 {
            return self.max_delay;
        }

        Duration::from_millis(millis as u64).min(self.max_delay)
    }

    /// Whether another status request is allowed after `attempts` requests.
    #[must_use]
    pub fn allows_attempt(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }

    /// Validates the policy values.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(crate::Error::configuration().with_message(format!(
                "Poll backoff multiplier must be at least 1.0, got {}",
                self.multiplier
            )));
        }

        if self.max_delay < self.initial_delay {
            return Err(crate::Error::configuration()
                .with_message("Maximum poll delay must not be lower than the initial delay"));
        }

        if self.max_attempts == Some(0) {
            return Err(crate::Error::configuration()
                .with_message("Maximum poll attempts must be greater than 0"));
        }

        Ok(())
    }
}
