#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for job submission.
pub const TRACING_TARGET_SUBMIT: &str = "nvisy_ocr::submit";

/// Tracing target for the job status polling loop.
pub const TRACING_TARGET_POLL: &str = "nvisy_ocr::poll";

/// Tracing target for whole-invocation service operations.
pub const TRACING_TARGET_SERVICE: &str = "nvisy_ocr::service";

mod config;
mod credential;
mod document;
mod error;
mod job;
mod policy;
mod response;
mod service;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
#[doc(hidden)]
pub mod prelude;

pub use crate::config::{DEFAULT_API_KEY_HEADER, DEFAULT_ENDPOINT, OcrConfig};
pub use crate::credential::Credential;
pub use crate::document::{DocumentStream, OCTET_STREAM};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::job::{JobHandle, JobStatus, SubmissionOutcome};
pub use crate::policy::PollPolicy;
pub use crate::response::{
    OcrResult, ReadAnalysis, RecognitionLine, RecognitionResult, RecognitionWord,
    TerminalResponse,
};
pub use crate::service::{OcrService, OcrTransport, PollResponse, SubmitResponse};
