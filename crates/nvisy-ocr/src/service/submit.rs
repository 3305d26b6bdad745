//! Job submission.

use tokio_util::sync::CancellationToken;

use super::{OcrService, guarded};
use crate::{DocumentStream, Error, JobHandle, Result, SubmissionOutcome, TRACING_TARGET_SUBMIT};

/// Status code of an accepted asynchronous submission.
const HTTP_ACCEPTED: u16 = 202;

impl OcrService {
    /// Submits a document to the analyze endpoint.
    ///
    /// A response other than `202 Accepted` is a normal [`SubmissionOutcome::Rejected`]
    /// outcome. Transport failures are returned as errors and never retried.
    pub async fn submit(
        &self,
        document: impl Into<DocumentStream>,
        api_key: &str,
    ) -> Result<SubmissionOutcome> {
        self.submit_with_cancellation(document, api_key, &CancellationToken::new())
            .await
    }

    /// Submits a document, aborting the request if `cancel` fires.
    pub async fn submit_with_cancellation(
        &self,
        document: impl Into<DocumentStream>,
        api_key: &str,
        cancel: &CancellationToken,
    ) -> Result<SubmissionOutcome> {
        let document = document.into();
        let credential = self.credential(api_key);

        tracing::debug!(
            target: TRACING_TARGET_SUBMIT,
            endpoint = %self.endpoint(),
            size_hint = ?document.size_hint(),
            "Submitting document"
        );

        let response = guarded(
            self.transport()
                .submit(self.endpoint(), &credential, document),
            cancel,
            None,
            "submission",
        )
        .await?;

        tracing::trace!(
            target: TRACING_TARGET_SUBMIT,
            status_code = response.status_code,
            operation_location = ?response.operation_location,
            "Analyze response received"
        );

        if response.status_code != HTTP_ACCEPTED {
            tracing::warn!(
                target: TRACING_TARGET_SUBMIT,
                status_code = response.status_code,
                "Document rejected, signalling default parser fallback"
            );
            return Ok(SubmissionOutcome::Rejected {
                status_code: response.status_code,
            });
        }

        let location = response.operation_location.ok_or_else(|| {
            Error::protocol().with_message("Accepted submission carries no Operation-Location header")
        })?;
        let job = JobHandle::parse(&location)?;

        tracing::debug!(
            target: TRACING_TARGET_SUBMIT,
            job = %job,
            "Document accepted"
        );

        Ok(SubmissionOutcome::Accepted { job })
    }
}
