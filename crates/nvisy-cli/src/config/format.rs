//! Output and log format selection.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How the OCR result is written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// The complete result as pretty-printed JSON.
    #[default]
    Json,
    /// Recognized lines only, one per line.
    Text,
}

/// How log records are written to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per record.
    Json,
}
