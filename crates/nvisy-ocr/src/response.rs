//! Outcome of an OCR invocation and the structured view of its payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{JobStatus, Result};

/// Body and status of the first poll that reported a non-running job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalResponse {
    /// Raw response body.
    pub body: String,
    /// HTTP status of the response.
    pub status_code: u16,
    /// Parsed `status` field, `None` when the document has none.
    pub status: Option<JobStatus>,
    /// Number of status requests issued for the job.
    pub attempts: u32,
}

/// Unified outcome of one submit/poll invocation.
///
/// Either the job reached a terminal state and `extracted_text` holds the final
/// document, or `use_default_parser` is set and callers should fall back to a
/// non-OCR extraction path. A still-running job is never returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    /// Raw terminal document returned by the service.
    pub extracted_text: String,
    /// HTTP status of the terminal or failing request.
    pub status_code: u16,
    /// Whether the service failed to produce a usable OCR job.
    pub use_default_parser: bool,
    /// Additional fields not modelled by this type.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl OcrResult {
    /// Result for a submission the service refused.
    pub fn fallback(status_code: u16) -> Self {
        Self {
            extracted_text: String::new(),
            status_code,
            use_default_parser: true,
            extensions: Map::new(),
        }
    }

    /// Result for a job that reached a terminal state.
    pub fn completed(terminal: TerminalResponse) -> Self {
        Self {
            extracted_text: terminal.body,
            status_code: terminal.status_code,
            use_default_parser: false,
            extensions: Map::new(),
        }
    }

    /// Adds an extension field.
    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Returns an extension field.
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    /// Parses the terminal document into its known fields.
    ///
    /// Returns `None` for fallback results, which carry no document.
    pub fn analysis(&self) -> Option<Result<ReadAnalysis>> {
        if self.use_default_parser {
            return None;
        }

        Some(serde_json::from_str(&self.extracted_text).map_err(Into::into))
    }
}

/// Batch Read result document.
///
/// Known fields are typed; everything else is preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadAnalysis {
    /// Job status at the time the document was produced.
    #[serde(default)]
    pub status: Option<JobStatus>,
    /// Per-page recognition output.
    #[serde(default)]
    pub recognition_results: Vec<RecognitionResult>,
    /// Fields this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReadAnalysis {
    /// Whether the job finished successfully.
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        matches!(self.status, Some(JobStatus::Succeeded))
    }

    /// Iterates over every recognized line in page order.
    pub fn lines(&self) -> impl Iterator<Item = &RecognitionLine> {
        self.recognition_results.iter().flat_map(|r| r.lines.iter())
    }

    /// Joins the text of every recognized line with newlines.
    pub fn text(&self) -> String {
        self.lines()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Recognition output for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    /// One-based page number.
    #[serde(default)]
    pub page: Option<u32>,
    /// Page width in `unit`.
    #[serde(default)]
    pub width: Option<f64>,
    /// Page height in `unit`.
    #[serde(default)]
    pub height: Option<f64>,
    /// Measurement unit, `pixel` or `inch`.
    #[serde(default)]
    pub unit: Option<String>,
    /// Recognized lines.
    #[serde(default)]
    pub lines: Vec<RecognitionLine>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A recognized line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionLine {
    /// Line text.
    pub text: String,
    /// Quadrilateral as eight coordinates.
    #[serde(default)]
    pub bounding_box: Vec<f64>,
    /// Words of the line.
    #[serde(default)]
    pub words: Vec<RecognitionWord>,
}

/// A recognized word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionWord {
    /// Word text.
    pub text: String,
    /// Quadrilateral as eight coordinates.
    #[serde(default)]
    pub bounding_box: Vec<f64>,
    /// Reported for low-confidence words only.
    #[serde(default)]
    pub confidence: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const SUCCEEDED: &str = r#"{
        "status": "Succeeded",
        "recognitionResults": [
            {
                "page": 1,
                "clockwiseOrientation": 349.59,
                "width": 3200,
                "height": 3200,
                "unit": "pixel",
                "lines": [
                    {
                        "boundingBox": [202, 618, 2047, 643, 2046, 840, 200, 813],
                        "text": "Our greatest glory is not",
                        "words": [
                            {"boundingBox": [204, 627, 481, 628, 481, 830, 204, 829], "text": "Our"}
                        ]
                    },
                    {
                        "boundingBox": [420, 1273, 2954, 1250, 2958, 1488, 422, 1511],
                        "text": "but in rising every time we fall",
                        "words": [
                            {"boundingBox": [423, 1269, 634, 1268, 635, 1507, 424, 1508], "text": "but", "confidence": "Low"}
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_fallback() {
        let result = OcrResult::fallback(400);
        assert!(result.use_default_parser);
        assert_eq!(result.status_code, 400);
        assert!(result.extracted_text.is_empty());
        assert!(result.analysis().is_none());
    }

    #[test]
    fn test_completed() {
        let result = OcrResult::completed(TerminalResponse {
            body: SUCCEEDED.to_owned(),
            status_code: 200,
            status: Some(JobStatus::Succeeded),
            attempts: 2,
        });

        assert!(!result.use_default_parser);
        assert_eq!(result.status_code, 200);
        assert_eq!(result.extracted_text, SUCCEEDED);
    }

    #[test]
    fn test_analysis_known_fields_and_residual() {
        let result = OcrResult::completed(TerminalResponse {
            body: SUCCEEDED.to_owned(),
            status_code: 200,
            status: Some(JobStatus::Succeeded),
            attempts: 1,
        });

        let analysis = result.analysis().unwrap().unwrap();
        assert!(analysis.is_succeeded());
        assert_eq!(analysis.recognition_results.len(), 1);

        let page = &analysis.recognition_results[0];
        assert_eq!(page.page, Some(1));
        assert_eq!(page.unit.as_deref(), Some("pixel"));
        assert_eq!(page.extra.get("clockwiseOrientation"), Some(&json!(349.59)));

        assert_eq!(
            analysis.text(),
            "Our greatest glory is not\nbut in rising every time we fall"
        );
        let low = &analysis.lines().nth(1).unwrap().words[0];
        assert_eq!(low.confidence.as_deref(), Some("Low"));
    }

    #[test]
    fn test_analysis_of_unknown_document() {
        let result = OcrResult::completed(TerminalResponse {
            body: r#"{"status":"Succeeded","text":"hello"}"#.to_owned(),
            status_code: 200,
            status: Some(JobStatus::Succeeded),
            attempts: 2,
        });

        let analysis = result.analysis().unwrap().unwrap();
        assert!(analysis.recognition_results.is_empty());
        assert_eq!(analysis.extra.get("text"), Some(&json!("hello")));
        assert_eq!(analysis.text(), "");
    }

    #[test]
    fn test_analysis_of_malformed_document() {
        let result = OcrResult::completed(TerminalResponse {
            body: "<html>".to_owned(),
            status_code: 502,
            status: None,
            attempts: 1,
        });

        let error = result.analysis().unwrap().unwrap_err();
        assert_eq!(error.kind, crate::ErrorKind::Serialization);
    }

    #[test]
    fn test_extensions_serialization() {
        let result = OcrResult::fallback(415).with_extension("source", "scanner-3");
        assert_eq!(result.extension("source"), Some(&json!("scanner-3")));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["useDefaultParser"], json!(true));
        assert_eq!(value["statusCode"], json!(415));
        assert_eq!(value["extensions"]["source"], json!("scanner-3"));

        let plain = serde_json::to_value(OcrResult::fallback(400)).unwrap();
        assert!(plain.get("extensions").is_none());
    }
}
