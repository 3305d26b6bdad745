//! Internal error types for nvisy-reqwest.

use thiserror::Error;

/// Result type alias for nvisy-reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Internal error type for nvisy-reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Credential cannot be sent as a header.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl From<Error> for nvisy_ocr::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    nvisy_ocr::Error::timeout()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    nvisy_ocr::Error::network_error()
                        .with_message("Connection failed")
                        .with_source(e)
                } else if e.is_builder() {
                    nvisy_ocr::Error::configuration()
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    nvisy_ocr::Error::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::InvalidHeader(message) => {
                nvisy_ocr::Error::invalid_input().with_message(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use nvisy_ocr::ErrorKind;

    use super::*;

    #[test]
    fn test_invalid_header_maps_to_invalid_input() {
        let error = nvisy_ocr::Error::from(Error::InvalidHeader("bad key".into()));
        assert_eq!(error.kind, ErrorKind::InvalidInput);
        assert!(!error.is_retryable());
    }
}
