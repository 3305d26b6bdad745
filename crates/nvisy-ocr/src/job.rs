//! Job handles, job status and submission outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Locator of an in-flight asynchronous OCR job.
///
/// Taken from the `Operation-Location` header of an accepted submission and
/// polled until the job reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(Url);

impl JobHandle {
    /// Wraps an already-parsed job URL.
    pub fn new(url: Url) -> Self {
        Self(url)
    }

    /// Parses the raw value of a location header.
    pub fn parse(location: &str) -> Result<Self> {
        let url = Url::parse(location.trim()).map_err(|e| {
            Error::protocol()
                .with_message(format!("Invalid job location '{location}'"))
                .with_source(e)
        })?;
        Ok(Self(url))
    }

    /// Returns the job URL.
    pub fn url(&self) -> &Url {
        &self.0
    }

    /// Returns the job URL as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Status reported in the top-level `status` field of a poll document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// The job is queued and has not started.
    NotStarted,
    /// The job is still being processed.
    Running,
    /// The job completed and the document carries results.
    Succeeded,
    /// The job failed on the service side.
    Failed,
    /// Any status value this client does not know about.
    Other(String),
}

impl JobStatus {
    /// Literal status value that keeps the poll loop going.
    pub const RUNNING: &'static str = "Running";

    /// Parses a raw status value. Matching is exact.
    pub fn parse(value: &str) -> Self {
        match value {
            "NotStarted" => Self::NotStarted,
            Self::RUNNING => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Extracts the status from a parsed poll document.
    ///
    /// Returns `None` when the document has no `status` field. A non-string
    /// status is kept as its JSON rendering.
    pub fn from_document(document: &serde_json::Value) -> Option<Self> {
        match document.get("status")? {
            serde_json::Value::String(value) => Some(Self::parse(value)),
            serde_json::Value::Null => None,
            other => Some(Self::Other(other.to_string())),
        }
    }

    /// Returns the wire value of this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotStarted => "NotStarted",
            Self::Running => Self::RUNNING,
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Other(other) => other,
        }
    }

    /// Whether polling must continue.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether the job reached a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.is_running()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// Outcome of the initial analyze request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The service accepted the document and started an asynchronous job.
    Accepted {
        /// Where to poll the job.
        job: JobHandle,
    },
    /// The service refused the document synchronously.
    Rejected {
        /// HTTP status of the refusal.
        status_code: u16,
    },
}

impl SubmissionOutcome {
    /// Whether a job was started.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Returns the job handle of an accepted submission.
    pub fn job(&self) -> Option<&JobHandle> {
        match self {
            Self::Accepted { job } => Some(job),
            Self::Rejected { .. } => None,
        }
    }
}
