//! HTTP transport abstraction.
//!
//! The engine never talks to an HTTP library directly; it goes through the
//! [`HttpClient`] trait so tests can script responses and hosts can plug in
//! their own stack. [`ReqwestClient`] is the shipped implementation.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// HTTP method of an [`HttpRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
}

/// One outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Bearer token for the `Authorization` header, if any.
    pub bearer: Option<String>,
    /// JSON body, if any.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            bearer: None,
            body: None,
        }
    }

    /// Creates a POST request with an optional JSON body.
    pub fn post(url: impl Into<String>, body: Option<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            bearer: None,
            body,
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_bearer(mut self, bearer: Option<String>) -> Self {
        self.bearer = bearer;
        self
    }
}

/// One incoming HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Type` header, if present.
    pub content_type: Option<String>,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Creates a JSON response, mostly useful for scripting tests.
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: body.into(),
        }
    }

    /// Creates a bodyless response.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: String::new(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true when the response declares a JSON content type.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }
}

/// Executes HTTP requests.
///
/// Implementations must be thread-safe; the push and pull loops share one
/// client. A transport-level failure (as opposed to a non-2xx response)
/// should surface as [`SyncError::Transport`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Executes one HTTP request and returns the raw response.
    async fn execute(&self, request: HttpRequest) -> SyncResult<HttpResponse>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for std::sync::Arc<T> {
    async fn execute(&self, request: HttpRequest) -> SyncResult<HttpResponse> {
        (**self).execute(request).await
    }
}

/// [`HttpClient`] backed by `reqwest`.
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns a fatal transport error if the underlying client cannot be
    /// constructed.
    pub fn new(timeout: Duration) -> SyncResult<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::transport_fatal(e.to_string()))?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: HttpRequest) -> SyncResult<HttpResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.inner.get(request.url.as_str()),
            HttpMethod::Post => self.inner.post(request.url.as_str()),
        };
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SyncError::transport_retryable(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| SyncError::transport_retryable(e.to_string()))?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

/// A scripted HTTP client for tests.
///
/// Responses are served in FIFO order; every executed request is recorded
/// so tests can assert on URLs, bearer tokens, and request counts. When
/// the script runs dry, requests fail with a retryable transport error.
#[derive(Default)]
pub struct MockHttpClient {
    responses: Mutex<VecDeque<SyncResult<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    /// Creates an empty mock client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the next response.
    pub fn push_response(&self, response: HttpResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Scripts the next call to fail with the given error.
    pub fn push_error(&self, error: SyncError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Returns a copy of all executed requests, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of executed requests.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn execute(&self, request: HttpRequest) -> SyncResult<HttpResponse> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SyncError::transport_retryable("no scripted response")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_classification() {
        assert!(HttpResponse::json(200, "{}").is_success());
        assert!(HttpResponse::json(204, "").is_success());
        assert!(!HttpResponse::json(401, "{}").is_success());

        assert!(HttpResponse::json(200, "{}").is_json());
        assert!(!HttpResponse::empty(200).is_json());

        let custom = HttpResponse {
            status: 200,
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: "{}".to_string(),
        };
        assert!(custom.is_json());
    }

    #[tokio::test]
    async fn mock_serves_scripted_responses_in_order() {
        let mock = MockHttpClient::new();
        mock.push_response(HttpResponse::json(200, r#"{"a":1}"#));
        mock.push_response(HttpResponse::empty(204));

        let first = mock.execute(HttpRequest::get("http://x/1")).await.unwrap();
        assert_eq!(first.status, 200);
        let second = mock.execute(HttpRequest::get("http://x/2")).await.unwrap();
        assert_eq!(second.status, 204);

        assert_eq!(mock.request_count(), 2);
        assert_eq!(mock.requests()[0].url, "http://x/1");
    }

    #[tokio::test]
    async fn mock_fails_when_script_runs_dry() {
        let mock = MockHttpClient::new();
        let result = mock.execute(HttpRequest::get("http://x")).await;
        assert!(matches!(result, Err(SyncError::Transport { .. })));
        assert_eq!(mock.request_count(), 1);
    }
}
