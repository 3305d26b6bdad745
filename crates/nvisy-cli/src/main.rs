#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod output;
mod signal;
mod telemetry;

use std::io::Write;
use std::process;

use anyhow::Context;
use nvisy_ocr::{DocumentStream, OcrResult, OcrService};
use nvisy_reqwest::ReqwestClient;
use tokio_util::sync::CancellationToken;

use crate::config::{Cli, OutputFormat};

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "nvisy_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "nvisy_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "nvisy_cli::config";
pub const TRACING_TARGET_OUTPUT: &str = "nvisy_cli::output";

/// Exit code signalling that the default parser should be used.
const EXIT_FALLBACK: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::init();

    if let Err(error) = telemetry::init_tracing(cli.log_format) {
        eprintln!("Warning: {error:#}");
    }

    let error = match run(cli).await {
        Ok(code) => process::exit(code),
        Err(error) => error,
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            cause = %error.root_cause(),
            "OCR invocation failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point, returning the process exit code.
async fn run(cli: Cli) -> anyhow::Result<i32> {
    cli.validate()?;
    cli.log();

    let client = ReqwestClient::new(cli.http.clone()).context("failed to create HTTP client")?;
    let service = client
        .into_service(cli.ocr.clone())
        .context("failed to create OCR service")?;

    let cancel = CancellationToken::new();
    signal::cancel_on_signal(cancel.clone());

    let result = execute(&service, &cli, &cancel).await;
    cancel.cancel();

    report(&result?, cli.output)
}

/// Recognizes the configured file.
async fn execute(
    service: &OcrService,
    cli: &Cli,
    cancel: &CancellationToken,
) -> anyhow::Result<OcrResult> {
    let document = DocumentStream::open(&cli.file)
        .await
        .with_context(|| format!("failed to open {}", cli.file.display()))?;

    let result = service
        .analyze_with_limits(document, &cli.api_key, cancel, cli.timeout())
        .await;

    result.with_context(|| format!("failed to recognize {}", cli.file.display()))
}

/// Prints the result and maps it to an exit code.
fn report(result: &OcrResult, format: OutputFormat) -> anyhow::Result<i32> {
    let rendered = output::render(result, format)?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").context("failed to write result")?;

    if result.use_default_parser {
        tracing::warn!(
            target: TRACING_TARGET_OUTPUT,
            status_code = result.status_code,
            "Service rejected the document, use the default parser"
        );
        return Ok(EXIT_FALLBACK);
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use nvisy_ocr::mock::MockTransport;
    use nvisy_ocr::{ErrorKind, OcrConfig, PollPolicy};

    use super::*;

    fn cli(path: &std::path::Path, extra: &[&str]) -> Cli {
        let mut args = vec!["nvisy-ocr", path.to_str().unwrap(), "--api-key", "k"];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    fn service(transport: MockTransport) -> OcrService {
        let config = OcrConfig::new("https://ocr.example.com/analyze")
            .with_poll_policy(&PollPolicy::fixed(Duration::from_millis(10)));
        OcrService::new(transport, config).unwrap()
    }

    fn document() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"scan bytes").unwrap();
        file
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_recognizes_file() {
        let file = document();
        let transport = MockTransport::accepted("https://ocr.example.com/operations/1")
            .with_poll(200, r#"{"status":"Running"}"#)
            .with_poll(200, r#"{"status":"Succeeded","recognitionResults":[]}"#);

        let result = execute(
            &service(transport.clone()),
            &cli(file.path(), &[]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(!result.use_default_parser);
        assert_eq!(transport.submitted_bodies(), vec![b"scan bytes".to_vec()]);
        assert_eq!(report(&result, OutputFormat::Json).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejected_document_exits_with_fallback_code() {
        let file = document();

        let result = execute(
            &service(MockTransport::rejected(415)),
            &cli(file.path(), &[]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report(&result, OutputFormat::Text).unwrap(), EXIT_FALLBACK);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let transport = MockTransport::rejected(400);
        let cli = cli(std::path::Path::new("/nonexistent/scan.png"), &[]);

        let error = execute(&service(transport.clone()), &cli, &CancellationToken::new())
            .await
            .unwrap_err();

        let error = error.downcast_ref::<nvisy_ocr::Error>().unwrap();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
        assert_eq!(transport.submit_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_bounds_the_invocation() {
        let file = document();
        let transport = MockTransport::accepted("https://ocr.example.com/operations/1")
            .with_repeated_poll(200, r#"{"status":"Running"}"#);
        let config = OcrConfig::new("https://ocr.example.com/analyze")
            .with_poll_policy(&PollPolicy::unbounded());
        let service = OcrService::new(transport, config).unwrap();

        let error = execute(
            &service,
            &cli(file.path(), &["--timeout", "1"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        let error = error.downcast_ref::<nvisy_ocr::Error>().unwrap();
        assert_eq!(error.kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_cancelled_invocation_is_an_error() {
        let file = document();
        let transport = MockTransport::accepted("https://ocr.example.com/operations/1")
            .with_repeated_poll(200, r#"{"status":"Running"}"#);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = execute(&service(transport), &cli(file.path(), &[]), &cancel)
            .await
            .unwrap_err();

        let error = error.downcast_ref::<nvisy_ocr::Error>().unwrap();
        assert_eq!(error.kind, ErrorKind::Cancelled);
    }
}
