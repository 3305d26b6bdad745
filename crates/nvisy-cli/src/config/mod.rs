//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── file, api_key, timeout       # What to recognize and with which key
//! ├── output, log_format           # How results and logs are written
//! ├── ocr: OcrConfig               # Endpoint, credential header, polling
//! └── http: ReqwestConfig          # Request/connect timeouts, user agent
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! nvisy-ocr scan.png --api-key "..." --output text
//!
//! # Or via environment variables
//! OCR_API_KEY="..." OCR_ENDPOINT="https://..." nvisy-ocr scan.png
//! ```

mod format;

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
pub use format::{LogFormat, OutputFormat};
use nvisy_ocr::OcrConfig;
use nvisy_reqwest::ReqwestConfig;
use serde::{Deserialize, Serialize};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
///
/// Combines the invocation arguments with the configuration groups of the
/// OCR client:
/// - [`OcrConfig`]: analyze endpoint, credential header and polling policy
/// - [`ReqwestConfig`]: HTTP transport timeouts and user agent
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "nvisy-ocr")]
#[command(about = "Recognize text in a document with the asynchronous OCR service")]
#[command(version)]
pub struct Cli {
    /// Document to recognize.
    pub file: PathBuf,

    /// Subscription key sent with every request.
    #[arg(long, env = "OCR_API_KEY", hide_env_values = true)]
    #[serde(skip_serializing, default)]
    pub api_key: String,

    /// Upper bound for the whole invocation, in seconds.
    #[arg(long, env = "OCR_TIMEOUT")]
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Result format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    #[serde(default)]
    pub output: OutputFormat,

    /// Log format written to stderr.
    #[arg(long, value_enum, env = "LOG_FORMAT", default_value_t = LogFormat::Text)]
    #[serde(default)]
    pub log_format: LogFormat,

    /// OCR service configuration.
    #[clap(flatten)]
    pub ocr: OcrConfig,

    /// HTTP transport configuration.
    #[clap(flatten)]
    pub http: ReqwestConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// This is the preferred way to initialize the CLI configuration as it ensures
    /// .env files are loaded before clap parses arguments, allowing environment
    /// variables from .env to be used as defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Returns the invocation-wide timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("an API key is required (--api-key or OCR_API_KEY)");
        }

        self.ocr.validate().context("invalid OCR configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            file = %self.file.display(),
            endpoint = %self.ocr.endpoint,
            api_key_header = %self.ocr.api_key_header,
            poll_policy = ?self.ocr.poll_policy(),
            http_timeout_ms = self.http.timeout().as_millis(),
            timeout_secs = ?self.timeout,
            "OCR configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
