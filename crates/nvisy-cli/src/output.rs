//! Result rendering.

use anyhow::Context;
use nvisy_ocr::OcrResult;

use crate::TRACING_TARGET_OUTPUT;
use crate::config::OutputFormat;

/// Renders `result` in the requested format.
///
/// The text format prints the recognized lines of a Batch Read document and
/// falls back to the raw response body when it carries no recognition results. A fallback
/// result renders as an empty string.
pub fn render(result: &OcrResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(result).context("failed to serialize OCR result")
        }
        OutputFormat::Text => match result.analysis() {
            None => Ok(String::new()),
            Some(Ok(analysis)) if !analysis.recognition_results.is_empty() => {
                Ok(analysis.text())
            }
            Some(Ok(_)) => Ok(result.extracted_text.clone()),
            Some(Err(error)) => {
                tracing::debug!(
                    target: TRACING_TARGET_OUTPUT,
                    error = %error,
                    "Response is not a recognition document, printing raw body"
                );
                Ok(result.extracted_text.clone())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use nvisy_ocr::TerminalResponse;

    use super::*;

    fn completed(body: &str) -> OcrResult {
        OcrResult::completed(TerminalResponse {
            body: body.to_owned(),
            status_code: 200,
            status: None,
            attempts: 1,
        })
    }

    #[test]
    fn test_json_output() {
        let rendered = render(&OcrResult::fallback(415), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["statusCode"], 415);
        assert_eq!(value["useDefaultParser"], true);
        assert_eq!(value["extractedText"], "");
    }

    #[test]
    fn test_text_output_joins_lines() {
        let result = completed(
            r#"{"status":"Succeeded","recognitionResults":[{"lines":[{"text":"one"},{"text":"two"}]}]}"#,
        );
        assert_eq!(render(&result, OutputFormat::Text).unwrap(), "one\ntwo");
    }

    #[test]
    fn test_text_output_of_unknown_shape_is_raw_body() {
        let result = completed(r#"{"text":["hello"]}"#);
        let rendered = render(&result, OutputFormat::Text).unwrap();
        assert_eq!(rendered, r#"{"text":["hello"]}"#);
    }

    #[test]
    fn test_text_output_of_fallback_is_empty() {
        let rendered = render(&OcrResult::fallback(400), OutputFormat::Text).unwrap();
        assert!(rendered.is_empty());
    }
}
