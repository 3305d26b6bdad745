//! Configuration for the reqwest client.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default timeout for a single HTTP request: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for establishing a connection: 10 seconds.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the reqwest HTTP client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// Timeout for a single HTTP request, in milliseconds
    #[cfg_attr(feature = "config", arg(long = "http-timeout-ms", env = "HTTP_TIMEOUT_MS"))]
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Timeout for establishing a connection, in milliseconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-connect-timeout-ms", env = "HTTP_CONNECT_TIMEOUT_MS")
    )]
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,

    /// User-Agent header sent with every request
    #[cfg_attr(feature = "config", arg(long = "http-user-agent", env = "HTTP_USER_AGENT"))]
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl ReqwestConfig {
    /// Sets the request timeout, rounded up to whole milliseconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(ceil_millis(timeout));
        self
    }

    /// Sets the connect timeout, rounded up to whole milliseconds.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = Some(ceil_millis(timeout));
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Returns the effective request timeout, using the default if unset or zero.
    pub fn timeout(&self) -> Duration {
        match self.timeout_ms {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => DEFAULT_TIMEOUT,
        }
    }

    /// Returns the effective connect timeout, using the default if unset or zero.
    pub fn connect_timeout(&self) -> Duration {
        match self.connect_timeout_ms {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Returns the effective user agent, using the default if unset or empty.
    pub fn user_agent(&self) -> String {
        match self.user_agent.as_deref() {
            Some(user_agent) if !user_agent.is_empty() => user_agent.to_owned(),
            _ => format!("nvisy-ocr/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Whole milliseconds in `duration`, rounded up so a non-zero duration never becomes zero.
fn ceil_millis(duration: Duration) -> u64 {
    let partial = u128::from(duration.subsec_nanos() % 1_000_000 != 0);
    u64::try_from(duration.as_millis() + partial).unwrap_or(u64::MAX)
}
