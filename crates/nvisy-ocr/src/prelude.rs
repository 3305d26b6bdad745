//! Prelude for the nvisy-ocr crate
//!
//! This module re-exports the most commonly used types and traits from the crate
//! to provide a convenient single import for users.

pub use crate::error::{Error, ErrorKind, Result};
pub use crate::{
    DocumentStream, JobHandle, JobStatus, OcrConfig, OcrResult, OcrService, OcrTransport,
    PollPolicy,
};
