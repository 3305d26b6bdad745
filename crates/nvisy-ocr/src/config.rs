//! OCR service configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::policy::{DEFAULT_DEADLINE, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY};
use crate::{Error, PollPolicy, Result};

/// Batch Read analyze endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str =
    "https://westcentralus.api.cognitive.microsoft.com/vision/v2.0/read/core/asyncBatchAnalyze";

/// Header carrying the API key.
pub const DEFAULT_API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Configuration for the OCR protocol client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct OcrConfig {
    /// Analyze endpoint receiving document submissions
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-endpoint", env = "OCR_ENDPOINT", default_value = DEFAULT_ENDPOINT)
    )]
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Header name carrying the API key
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-api-key-header", env = "OCR_API_KEY_HEADER", default_value = DEFAULT_API_KEY_HEADER)
    )]
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Delay after the first running status, in milliseconds
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-poll-interval-ms", env = "OCR_POLL_INTERVAL_MS", default_value = "50")
    )]
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum delay between polls, in milliseconds
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-poll-max-interval-ms", env = "OCR_POLL_MAX_INTERVAL_MS", default_value = "2000")
    )]
    #[serde(default = "default_poll_max_interval_ms")]
    pub poll_max_interval_ms: u64,

    /// Backoff multiplier applied to the poll interval
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-poll-backoff", env = "OCR_POLL_BACKOFF", default_value = "2.0")
    )]
    #[serde(default = "default_poll_backoff")]
    pub poll_backoff: f64,

    /// Maximum number of status requests per job
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-poll-max-attempts", env = "OCR_POLL_MAX_ATTEMPTS")
    )]
    #[serde(default)]
    pub poll_max_attempts: Option<u32>,

    /// Time budget for a job to finish, in milliseconds (0 disables the limit)
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-poll-deadline-ms", env = "OCR_POLL_DEADLINE_MS", default_value = "300000")
    )]
    #[serde(default = "default_poll_deadline_ms")]
    pub poll_deadline_ms: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_owned()
}

fn default_api_key_header() -> String {
    DEFAULT_API_KEY_HEADER.to_owned()
}

fn default_poll_interval_ms() -> u64 {
    ceil_millis(DEFAULT_INITIAL_DELAY)
}

fn default_poll_max_interval_ms() -> u64 {
    ceil_millis(DEFAULT_MAX_DELAY)
}

fn default_poll_backoff() -> f64 {
    2.0
}

fn default_poll_deadline_ms() -> u64 {
    ceil_millis(DEFAULT_DEADLINE)
}

/// Whole milliseconds in `duration`, rounded up so a non-zero duration never becomes zero.
fn ceil_millis(duration: Duration) -> u64 {
    let partial = u128::from(duration.subsec_nanos() % 1_000_000 != 0);
    u64::try_from(duration.as_millis() + partial).unwrap_or(u64::MAX)
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_header: default_api_key_header(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_interval_ms: default_poll_max_interval_ms(),
            poll_backoff: default_poll_backoff(),
            poll_max_attempts: None,
            poll_deadline_ms: default_poll_deadline_ms(),
        }
    }
}

impl OcrConfig {
    /// Creates a configuration for the given analyze endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set the API key header name.
    #[must_use]
    pub fn with_api_key_header(mut self, header: impl Into<String>) -> Self {
        self.api_key_header = header.into();
        self
    }

    /// Replace every polling setting with the given policy.
    #[must_use]
    pub fn with_poll_policy(mut self, policy: &PollPolicy) -> Self {
        self.poll_interval_ms = ceil_millis(policy.initial_delay);
        self.poll_max_interval_ms = ceil_millis(policy.max_delay);
        self.poll_backoff = policy.multiplier;
        self.poll_max_attempts = policy.max_attempts;
        self.poll_deadline_ms = policy.deadline.map_or(0, ceil_millis);
        self
    }

    /// Returns the parsed analyze endpoint.
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            Error::configuration()
                .with_message(format!("Invalid OCR endpoint '{}'", self.endpoint))
                .with_source(e)
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration().with_message(format!(
                "OCR endpoint '{}' must use http or https",
                self.endpoint
            )));
        }

        Ok(url)
    }

    /// Returns the polling policy described by this configuration.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            initial_delay: Duration::from_millis(self.poll_interval_ms),
            max_delay: Duration::from_millis(self.poll_max_interval_ms),
            multiplier: self.poll_backoff,
            max_attempts: self.poll_max_attempts,
            deadline: (self.poll_deadline_ms > 0)
                .then(|| Duration::from_millis(self.poll_deadline_ms)),
        }
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;

        if self.api_key_header.trim().is_empty() {
            return Err(Error::configuration().with_message("API key header must not be empty"));
        }

        self.poll_policy().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OcrConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.api_key_header, "Ocp-Apim-Subscription-Key");
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_policy(), PollPolicy::default());
    }

    #[test]
    fn test_zero_deadline_disables_limit() {
        let config = OcrConfig {
            poll_deadline_ms: 0,
            ..OcrConfig::default()
        };
        assert!(config.poll_policy().deadline.is_none());
    }

    #[test]
    fn test_with_poll_policy() {
        let policy = PollPolicy::fixed(Duration::from_millis(10)).with_max_attempts(4);
        let config = OcrConfig::new("http://localhost:8080/analyze").with_poll_policy(&policy);

        let derived = config.poll_policy();
        assert_eq!(derived.initial_delay, Duration::from_millis(10));
        assert_eq!(derived.multiplier, 1.0);
        assert_eq!(derived.max_attempts, Some(4));
        assert_eq!(derived.deadline, policy.deadline);
    }

    #[test]
    fn test_with_poll_policy_keeps_sub_second_deadline() {
        let policy = PollPolicy::fixed(Duration::from_millis(50))
            .with_deadline(Duration::from_millis(500));
        let config = OcrConfig::new("http://localhost:8080/analyze").with_poll_policy(&policy);

        assert_eq!(config.poll_policy().deadline, Some(Duration::from_millis(500)));

        let policy = policy.with_deadline(Duration::from_millis(2500));
        let config = config.with_poll_policy(&policy);
        assert_eq!(config.poll_policy().deadline, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_with_poll_policy_rounds_sub_millisecond_values_up() {
        let policy = PollPolicy::fixed(Duration::from_micros(300))
            .with_deadline(Duration::from_micros(700));
        let config = OcrConfig::new("http://localhost:8080/analyze").with_poll_policy(&policy);

        let derived = config.poll_policy();
        assert_eq!(derived.initial_delay, Duration::from_millis(1));
        assert_eq!(derived.max_delay, Duration::from_millis(1));
        assert_eq!(derived.deadline, Some(Duration::from_millis(1)));
    }

    #[test]
    fn test_ceil_millis() {
        assert_eq!(ceil_millis(Duration::ZERO), 0);
        assert_eq!(ceil_millis(Duration::from_micros(1)), 1);
        assert_eq!(ceil_millis(Duration::from_millis(2500)), 2500);
        assert_eq!(ceil_millis(Duration::from_secs(300)), 300_000);
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(OcrConfig::new("not a url").validate().is_err());
        assert!(OcrConfig::new("ftp://ocr.example.com").validate().is_err());
    }

    #[test]
    fn test_empty_header() {
        let config = OcrConfig::default().with_api_key_header(" ");
        assert!(config.validate().is_err());
    }
}
