//! OCR transport implementation.
//!
//! This module implements the [`OcrTransport`] trait for [`ReqwestClient`].

use nvisy_ocr::{
    Credential, DocumentStream, JobHandle, OCTET_STREAM, OcrTransport, PollResponse,
    SubmitResponse,
};
use reqwest::Body;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::connect::{ReqwestClient, TRACING_TARGET};
use crate::error::Error;

/// Header naming the job status resource of an accepted submission.
const OPERATION_LOCATION: &str = "operation-location";

/// Media type of status requests and responses.
const APPLICATION_JSON: &str = "application/json";

/// Builds the credential header, marked sensitive so it is never logged.
fn credential_headers(credential: &Credential) -> Result<HeaderMap, Error> {
    let name = HeaderName::from_bytes(credential.header().as_bytes()).map_err(|_| {
        Error::InvalidHeader(format!("'{}' is not a valid header name", credential.header()))
    })?;
    let mut value = HeaderValue::from_str(credential.key())
        .map_err(|_| Error::InvalidHeader("API key is not a valid header value".into()))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::with_capacity(1);
    headers.insert(name, value);
    Ok(headers)
}

#[async_trait::async_trait]
impl OcrTransport for ReqwestClient {
    async fn submit(
        &self,
        endpoint: &Url,
        credential: &Credential,
        document: DocumentStream,
    ) -> nvisy_ocr::Result<SubmitResponse> {
        let headers = credential_headers(credential)?;

        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %endpoint,
            size_hint = ?document.size_hint(),
            "Sending analyze request"
        );

        let response = self
            .http()
            .post(endpoint.clone())
            .headers(headers)
            .header(CONTENT_TYPE, OCTET_STREAM)
            .body(Body::wrap_stream(document.into_stream()))
            .send()
            .await
            .map_err(Error::from)?;

        let status_code = response.status().as_u16();
        let operation_location = response
            .headers()
            .get(OPERATION_LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        tracing::debug!(
            target: TRACING_TARGET,
            status_code,
            has_operation_location = operation_location.is_some(),
            "Analyze request completed"
        );

        Ok(SubmitResponse {
            status_code,
            operation_location,
        })
    }

    async fn fetch(
        &self,
        job: &JobHandle,
        credential: &Credential,
    ) -> nvisy_ocr::Result<PollResponse> {
        let headers = credential_headers(credential)?;

        let response = self
            .http()
            .get(job.url().clone())
            .headers(headers)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header(ACCEPT, APPLICATION_JSON)
            .send()
            .await
            .map_err(Error::from)?;

        let status_code = response.status().as_u16();
        let body = response.text().await.map_err(Error::from)?;

        tracing::trace!(
            target: TRACING_TARGET,
            job = %job,
            status_code,
            body_len = body.len(),
            "Status request completed"
        );

        Ok(PollResponse { status_code, body })
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::Router;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use bytes::Bytes;
    use nvisy_ocr::{ErrorKind, OcrConfig, OcrService, PollPolicy};

    use super::*;
    use crate::ReqwestConfig;

    const API_KEY: &str = "test-subscription-key";

    #[derive(Default)]
    struct Recorded {
        keys: Vec<Option<String>>,
        content_types: Vec<Option<String>>,
        content_lengths: Vec<Option<String>>,
        bodies: Vec<Bytes>,
    }

    #[derive(Clone)]
    struct StubState {
        addr: SocketAddr,
        analyze_status: StatusCode,
        running_polls: usize,
        polls: Arc<AtomicUsize>,
        recorded: Arc<Mutex<Recorded>>,
    }

    fn header(headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    async fn analyze(
        State(state): State<StubState>,
        headers: HeaderMap,
        body: Bytes,
    ) -> impl IntoResponse {
        {
            let mut recorded = state.recorded.lock().unwrap();
            recorded.keys.push(header(&headers, "ocp-apim-subscription-key"));
            recorded.content_types.push(header(&headers, "content-type"));
            recorded.content_lengths.push(header(&headers, "content-length"));
            recorded.bodies.push(body);
        }

        let location = format!("http://{}/operations/42", state.addr);
        (state.analyze_status, [("Operation-Location", location)])
    }

    async fn operation(State(state): State<StubState>, headers: HeaderMap) -> impl IntoResponse {
        state
            .recorded
            .lock()
            .unwrap()
            .keys
            .push(header(&headers, "ocp-apim-subscription-key"));

        let poll = state.polls.fetch_add(1, Ordering::SeqCst);
        if poll < state.running_polls {
            r#"{"status":"Running"}"#.to_owned()
        } else {
            r#"{"status":"Succeeded","recognitionResults":[{"page":1,"lines":[{"text":"hello world","boundingBox":[0,0,1,0,1,1,0,1],"words":[]}]}]}"#.to_owned()
        }
    }

    async fn spawn_stub(analyze_status: StatusCode, running_polls: usize) -> StubState {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let state = StubState {
            addr: listener.local_addr().unwrap(),
            analyze_status,
            running_polls,
            polls: Arc::default(),
            recorded: Arc::default(),
        };

        let app = Router::new()
            .route("/analyze", post(analyze))
            .route("/operations/42", get(operation))
            .with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        state
    }

    fn service(addr: SocketAddr) -> OcrService {
        let config = OcrConfig::new(format!("http://{addr}/analyze"))
            .with_poll_policy(&PollPolicy::fixed(Duration::from_millis(5)));
        ReqwestClient::with_defaults()
            .unwrap()
            .into_service(config)
            .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_end_to_end() {
        let stub = spawn_stub(StatusCode::ACCEPTED, 2).await;
        let service = service(stub.addr);

        let result = service.analyze(b"image".to_vec(), API_KEY).await.unwrap();

        assert_eq!(result.status_code, 200);
        assert!(!result.use_default_parser);
        let analysis = result.analysis().unwrap().unwrap();
        assert!(analysis.is_succeeded());
        assert_eq!(analysis.text(), "hello world");

        assert_eq!(stub.polls.load(Ordering::SeqCst), 3);
        let recorded = stub.recorded.lock().unwrap();
        assert_eq!(recorded.keys.len(), 4);
        assert!(recorded.keys.iter().all(|k| k.as_deref() == Some(API_KEY)));
        assert_eq!(recorded.content_types[0].as_deref(), Some(OCTET_STREAM));
        assert_eq!(recorded.bodies[0].as_ref(), b"image");
    }

    #[tokio::test]
    async fn test_rejected_submission_falls_back() {
        let stub = spawn_stub(StatusCode::BAD_REQUEST, 0).await;
        let service = service(stub.addr);

        let result = service.analyze(b"image".to_vec(), API_KEY).await.unwrap();

        assert_eq!(result.status_code, 400);
        assert!(result.use_default_parser);
        assert!(result.extracted_text.is_empty());
        assert_eq!(stub.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_streamed_document_is_sent_chunked() {
        let stub = spawn_stub(StatusCode::ACCEPTED, 0).await;
        let service = service(stub.addr);

        let chunks = vec![
            Ok(Bytes::from_static(b"first ")),
            Ok(Bytes::from_static(b"second ")),
            Ok(Bytes::from_static(b"third")),
        ];
        let document = DocumentStream::from_stream(futures::stream::iter(chunks));
        let outcome = service.submit(document, API_KEY).await.unwrap();

        assert!(outcome.is_accepted());
        let recorded = stub.recorded.lock().unwrap();
        assert_eq!(recorded.bodies[0].as_ref(), b"first second third");
        assert_eq!(recorded.content_lengths[0], None);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let error = service(addr)
            .analyze(b"image".to_vec(), API_KEY)
            .await
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::NetworkError);
        assert!(error.is_retryable());
    }

    #[tokio::test]
    async fn test_invalid_api_key_is_rejected_before_sending() {
        let stub = spawn_stub(StatusCode::ACCEPTED, 0).await;
        let service = service(stub.addr);

        let error = service
            .analyze(b"image".to_vec(), "bad\nkey")
            .await
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::InvalidInput);
        assert!(stub.recorded.lock().unwrap().bodies.is_empty());
    }

    #[test]
    fn test_credential_header_is_sensitive() {
        let credential = Credential::subscription_key("secret");
        let headers = credential_headers(&credential).unwrap();
        let value = headers.get("ocp-apim-subscription-key").unwrap();
        assert!(value.is_sensitive());
        assert_eq!(value, "secret");
    }

    #[test]
    fn test_client_config_is_used() {
        let client = ReqwestClient::new(ReqwestConfig::default().with_user_agent("scanner/1.0"))
            .unwrap();
        assert_eq!(client.config().user_agent(), "scanner/1.0");
    }
}
