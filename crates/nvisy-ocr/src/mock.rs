//! Scripted transport for testing code built on [`OcrService`].
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! nvisy-ocr = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use nvisy_ocr::mock::MockTransport;
//! use nvisy_ocr::{OcrConfig, OcrService};
//!
//! let transport = MockTransport::accepted("https://ocr.example.com/operations/1")
//!     .with_poll(200, r#"{"status":"Running"}"#)
//!     .with_poll(200, r#"{"status":"Succeeded"}"#);
//! let service = OcrService::new(transport.clone(), OcrConfig::default())?;
//! ```
//!
//! [`OcrService`]: crate::OcrService

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::TryStreamExt;
use url::Url;

use crate::{
    Credential, DocumentStream, Error, ErrorKind, JobHandle, OcrTransport, PollResponse, Result,
    SubmitResponse,
};

#[derive(Default)]
struct MockState {
    submit: Option<Result<SubmitResponse>>,
    polls: VecDeque<Result<PollResponse>>,
    repeated: Option<PollResponse>,
    fetch_latency: Option<Duration>,
    submitted_endpoints: Vec<String>,
    submitted_bodies: Vec<Vec<u8>>,
    polled_urls: Vec<String>,
    credentials: Vec<Credential>,
}

#[derive(Default)]
struct MockInner {
    state: Mutex<MockState>,
    open_bodies: AtomicUsize,
    max_open_bodies: AtomicUsize,
}

/// Transport answering from a script and recording every request.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

impl MockTransport {
    fn with_submit(submit: Result<SubmitResponse>) -> Self {
        let transport = Self::default();
        transport.state().submit = Some(submit);
        transport
    }

    /// Accepts the submission with the given `Operation-Location`.
    pub fn accepted(location: impl Into<String>) -> Self {
        Self::with_submit(Ok(SubmitResponse {
            status_code: 202,
            operation_location: Some(location.into()),
        }))
    }

    /// Accepts the submission without an `Operation-Location` header.
    pub fn accepted_without_location() -> Self {
        Self::with_submit(Ok(SubmitResponse {
            status_code: 202,
            operation_location: None,
        }))
    }

    /// Answers the submission with the given status code.
    pub fn rejected(status_code: u16) -> Self {
        Self::with_submit(Ok(SubmitResponse {
            status_code,
            operation_location: None,
        }))
    }

    /// Fails the submission with the given error.
    pub fn submit_error(error: Error) -> Self {
        Self::with_submit(Err(error))
    }

    /// Queues a status response.
    pub fn with_poll(self, status_code: u16, body: impl Into<String>) -> Self {
        self.state().polls.push_back(Ok(PollResponse {
            status_code,
            body: body.into(),
        }));
        self
    }

    /// Queues a failed status request.
    pub fn with_poll_error(self, error: Error) -> Self {
        self.state().polls.push_back(Err(error));
        self
    }

    /// Answers every status request with this response once the queue is empty.
    pub fn with_repeated_poll(self, status_code: u16, body: impl Into<String>) -> Self {
        self.state().repeated = Some(PollResponse {
            status_code,
            body: body.into(),
        });
        self
    }

    /// Delays every status response.
    pub fn with_fetch_latency(self, latency: Duration) -> Self {
        self.state().fetch_latency = Some(latency);
        self
    }

    /// Number of submissions received.
    pub fn submit_count(&self) -> usize {
        self.state().submitted_endpoints.len()
    }

    /// Number of status requests received.
    pub fn fetch_count(&self) -> usize {
        self.state().polled_urls.len()
    }

    /// Endpoints of every submission.
    pub fn submitted_endpoints(&self) -> Vec<String> {
        self.state().submitted_endpoints.clone()
    }

    /// Bodies of every submission.
    pub fn submitted_bodies(&self) -> Vec<Vec<u8>> {
        self.state().submitted_bodies.clone()
    }

    /// URLs of every status request.
    pub fn polled_urls(&self) -> Vec<String> {
        self.state().polled_urls.clone()
    }

    /// Credentials of every request, in order.
    pub fn credentials(&self) -> Vec<Credential> {
        self.state().credentials.clone()
    }

    /// Highest number of status responses that were being produced at once.
    pub fn max_open_bodies(&self) -> usize {
        self.inner.max_open_bodies.load(Ordering::SeqCst)
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl OcrTransport for MockTransport {
    async fn submit(
        &self,
        endpoint: &Url,
        credential: &Credential,
        document: DocumentStream,
    ) -> Result<SubmitResponse> {
        let body: Vec<u8> = document
            .into_stream()
            .map_ok(|chunk| chunk.to_vec())
            .try_concat()
            .await?;

        let mut state = self.state();
        state.submitted_endpoints.push(endpoint.to_string());
        state.submitted_bodies.push(body);
        state.credentials.push(credential.clone());

        state.submit.take().unwrap_or_else(|| {
            Err(Error::new(ErrorKind::Unknown).with_message("no scripted submission left"))
        })
    }

    async fn fetch(&self, job: &JobHandle, credential: &Credential) -> Result<PollResponse> {
        let _open = OpenBody::new(&self.inner);

        let latency = {
            let mut state = self.state();
            state.polled_urls.push(job.to_string());
            state.credentials.push(credential.clone());
            state.fetch_latency
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let response = {
            let mut state = self.state();
            match state.polls.pop_front() {
                Some(response) => response,
                None => state.repeated.clone().ok_or_else(|| {
                    Error::new(ErrorKind::Unknown).with_message("no scripted status response left")
                }),
            }
        };

        response
    }
}

/// Counts a status response as open until dropped, including when the fetch
/// future is dropped mid-flight.
struct OpenBody<'a> {
    inner: &'a MockInner,
}

impl<'a> OpenBody<'a> {
    fn new(inner: &'a MockInner) -> Self {
        let open = inner.open_bodies.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_open_bodies.fetch_max(open, Ordering::SeqCst);
        Self { inner }
    }
}

impl Drop for OpenBody<'_> {
    fn drop(&mut self) {
        self.inner.open_bodies.fetch_sub(1, Ordering::SeqCst);
    }
}
