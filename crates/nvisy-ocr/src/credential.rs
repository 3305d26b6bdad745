//! API credentials attached to every request of an invocation.

use std::fmt;

use crate::config::DEFAULT_API_KEY_HEADER;

/// API key sent as a request header.
///
/// The key is caller-supplied per invocation and never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    header: String,
    key: String,
}

impl Credential {
    /// Creates a credential sent under the given header name.
    pub fn new(header: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            key: key.into(),
        }
    }

    /// Creates a subscription key credential using the default header.
    pub fn subscription_key(key: impl Into<String>) -> Self {
        Self::new(DEFAULT_API_KEY_HEADER, key)
    }

    /// Returns the header name.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Returns the secret key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("header", &self.header)
            .field("key", &"[REDACTED]")
            .finish()
    }
}
