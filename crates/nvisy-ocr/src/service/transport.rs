//! Transport seam between the protocol client and an HTTP implementation.

use url::Url;

use crate::{Credential, DocumentStream, JobHandle, Result};

/// Immediate response to a document submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Raw `Operation-Location` header value, if present.
    pub operation_location: Option<String>,
}

/// A fully-read job status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body decoded as text.
    pub body: String,
}

/// HTTP operations required by the submit/poll protocol.
///
/// Implementations are shared by every invocation of an [`OcrService`] and must be
/// safe for concurrent use. They must release each response body before returning
/// and must not retry failed requests.
///
/// [`OcrService`]: crate::OcrService
#[async_trait::async_trait]
pub trait OcrTransport: Send + Sync {
    /// Posts the document to the analyze endpoint as an octet stream.
    ///
    /// Non-success status codes are returned as responses, not errors.
    async fn submit(
        &self,
        endpoint: &Url,
        credential: &Credential,
        document: DocumentStream,
    ) -> Result<SubmitResponse>;

    /// Fetches the current status document of a job.
    async fn fetch(&self, job: &JobHandle, credential: &Credential) -> Result<PollResponse>;
}
