//! OCR protocol service.
//!
//! [`OcrService`] drives one invocation at a time per call:
//!
//! ```text
//! submit ──202──▶ poll ─┬─ Running ──wait──▶ poll ...
//!   │                   └─ terminal ───────▶ OcrResult
//!   └──other──▶ OcrResult { use_default_parser: true }
//! ```

mod poll;
mod submit;
mod transport;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

pub use self::transport::{OcrTransport, PollResponse, SubmitResponse};
use crate::{
    Credential, DocumentStream, Error, OcrConfig, OcrResult, PollPolicy, Result,
    SubmissionOutcome, TRACING_TARGET_SERVICE,
};

/// Immutable state shared by every clone of the service.
struct OcrServiceInner {
    transport: Arc<dyn OcrTransport>,
    endpoint: Url,
    api_key_header: String,
    policy: PollPolicy,
}

/// Client for an asynchronous OCR service.
///
/// The transport is injected and shared; the service holds no per-invocation
/// state, so it can be cloned cheaply and used concurrently.
///
/// # Examples
///
/// ```rust,ignore
/// use nvisy_ocr::{DocumentStream, OcrConfig, OcrService};
/// use nvisy_reqwest::ReqwestClient;
///
/// let service = ReqwestClient::with_defaults()?.into_service(OcrConfig::default())?;
/// let document = DocumentStream::open("scan.png").await?;
/// let result = service.analyze(document, &api_key).await?;
///
/// if result.use_default_parser {
///     // fall back to plain text extraction
/// }
/// ```
#[derive(Clone)]
pub struct OcrService {
    inner: Arc<OcrServiceInner>,
}

impl fmt::Debug for OcrService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrService")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("policy", &self.inner.policy)
            .finish_non_exhaustive()
    }
}

impl OcrService {
    /// Creates a new service over the given transport.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn new<T>(transport: T, config: OcrConfig) -> Result<Self>
    where
        T: OcrTransport + 'static,
    {
        Self::from_shared(Arc::new(transport), config)
    }

    /// Creates a new service over an already shared transport.
    pub fn from_shared(transport: Arc<dyn OcrTransport>, config: OcrConfig) -> Result<Self> {
        config.validate()?;

        let inner = OcrServiceInner {
            transport,
            endpoint: config.endpoint_url()?,
            policy: config.poll_policy(),
            api_key_header: config.api_key_header,
        };

        tracing::debug!(
            target: TRACING_TARGET_SERVICE,
            endpoint = %inner.endpoint,
            policy = ?inner.policy,
            "Created OCR service"
        );

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Returns the analyze endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Returns the polling policy.
    pub fn poll_policy(&self) -> &PollPolicy {
        &self.inner.policy
    }

    /// Builds the credential sent with every request for `api_key`.
    pub fn credential(&self, api_key: &str) -> Credential {
        Credential::new(self.inner.api_key_header.as_str(), api_key)
    }

    /// Submits a document and waits for the job to finish.
    pub async fn analyze(
        &self,
        document: impl Into<DocumentStream>,
        api_key: &str,
    ) -> Result<OcrResult> {
        self.analyze_with_cancellation(document, api_key, &CancellationToken::new())
            .await
    }

    /// Submits a document and waits for the job to finish, giving up with a
    /// timeout error once `timeout` elapses.
    pub async fn analyze_with_timeout(
        &self,
        document: impl Into<DocumentStream>,
        api_key: &str,
        timeout: Duration,
    ) -> Result<OcrResult> {
        self.analyze_with_limits(document, api_key, &CancellationToken::new(), Some(timeout))
            .await
    }

    /// Submits a document and waits for the job to finish, aborting as soon as
    /// `cancel` fires and giving up with a timeout error once `timeout`, if any,
    /// elapses.
    pub async fn analyze_with_limits(
        &self,
        document: impl Into<DocumentStream>,
        api_key: &str,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<OcrResult> {
        let analysis = self.analyze_with_cancellation(document, api_key, cancel);
        let Some(timeout) = timeout else {
            return analysis.await;
        };

        tokio::time::timeout(timeout, analysis).await.map_err(|_| {
            Error::timeout().with_message(format!(
                "OCR invocation did not complete within {timeout:?}"
            ))
        })?
    }

    /// Submits a document and waits for the job to finish, aborting the
    /// in-flight request or wait as soon as `cancel` fires.
    pub async fn analyze_with_cancellation(
        &self,
        document: impl Into<DocumentStream>,
        api_key: &str,
        cancel: &CancellationToken,
    ) -> Result<OcrResult> {
        let started_at = Instant::now();

        let result = match self
            .submit_with_cancellation(document, api_key, cancel)
            .await?
        {
            SubmissionOutcome::Rejected { status_code } => OcrResult::fallback(status_code),
            SubmissionOutcome::Accepted { job } => {
                OcrResult::completed(self.poll(&job, api_key, cancel).await?)
            }
        };

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            status_code = result.status_code,
            use_default_parser = result.use_default_parser,
            body_len = result.extracted_text.len(),
            elapsed_ms = started_at.elapsed().as_millis(),
            "OCR invocation completed"
        );

        Ok(result)
    }

    pub(crate) fn transport(&self) -> &dyn OcrTransport {
        self.inner.transport.as_ref()
    }
}

/// Runs `future` unless the token fires or the deadline passes first.
pub(crate) async fn guarded<F, T>(
    future: F,
    cancel: &CancellationToken,
    deadline: Option<Instant>,
    stage: &'static str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let expired = async {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            Err(Error::cancelled().with_message(format!("Cancelled during {stage}")))
        }
        () = expired => {
            Err(Error::job_timeout().with_message(format!("Poll deadline passed during {stage}")))
        }
        result = future => result,
    }
}
