//! Reqwest-based HTTP client for the OCR service.

use std::sync::Arc;

use nvisy_ocr::{OcrConfig, OcrService};
use reqwest::Client;

use super::ReqwestConfig;
use crate::Result;

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "nvisy_reqwest::client";

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    config: ReqwestConfig,
}

/// Reqwest-based HTTP client that talks to the OCR service.
///
/// This client implements the [`OcrTransport`] trait. The connection pool is
/// shared by every clone, so one client should be built per process.
///
/// # Examples
///
/// ```rust,ignore
/// use nvisy_ocr::OcrConfig;
/// use nvisy_reqwest::{ReqwestClient, ReqwestConfig};
///
/// let client = ReqwestClient::new(ReqwestConfig::default())?;
/// let service = client.into_service(OcrConfig::default())?;
/// let result = service.analyze(bytes, &api_key).await?;
/// ```
///
/// [`OcrTransport`]: nvisy_ocr::OcrTransport
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new reqwest client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        let timeout = config.timeout();
        let connect_timeout = config.connect_timeout();
        let user_agent = config.user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ms = timeout.as_millis(),
            connect_timeout_ms = connect_timeout.as_millis(),
            user_agent = %user_agent,
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(user_agent)
            .build()?;

        let inner = ReqwestClientInner { http, config };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Creates a client with the default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ReqwestConfig::default())
    }

    /// Gets the underlying HTTP client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Converts this client into an [`OcrService`] for use with dependency injection.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn into_service(self, config: OcrConfig) -> nvisy_ocr::Result<OcrService> {
        OcrService::new(self, config)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nvisy_ocr::ErrorKind;

    use super::*;

    #[test]
    fn test_client_creation() {
        let config = ReqwestConfig::default().with_timeout(Duration::from_secs(5));
        let client = ReqwestClient::new(config).unwrap();
        assert_eq!(client.config().timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_into_service_validates_config() {
        let client = ReqwestClient::with_defaults().unwrap();
        let error = client
            .into_service(OcrConfig::new("ftp://ocr.example.com"))
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
    }
}
