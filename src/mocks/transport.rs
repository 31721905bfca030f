//! Scripted transport for exercising [`crate::api::HttpLogsClient`].

use crate::error::{LogsError, NetworkError};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Canned service answer.
#[derive(Debug, Clone)]
pub struct MockResponse(HttpResponse);

impl MockResponse {
    /// 200 with an empty body.
    pub fn empty() -> Self {
        Self::status(200, Bytes::new())
    }

    /// 200 with a JSON body.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::status(200, body).with_header("content-type", JSON_CONTENT_TYPE)
    }

    /// Any status with a raw body.
    pub fn status(status: u16, body: impl Into<Bytes>) -> Self {
        Self(HttpResponse::new(status, body))
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.headers.insert(name.into(), value.into());
        self
    }

    /// Tag the response with a service request id.
    pub fn with_request_id(self, request_id: impl Into<String>) -> Self {
        self.with_header("x-amzn-RequestId", request_id)
    }
}

#[derive(Default)]
struct Script {
    by_operation: HashMap<String, VecDeque<MockResponse>>,
    any: VecDeque<MockResponse>,
    fallback: Option<MockResponse>,
    sent: Vec<HttpRequest>,
}

impl Script {
    fn next(&mut self, operation: &str) -> Option<HttpResponse> {
        self.by_operation
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.any.pop_front())
            .or_else(|| self.fallback.clone())
            .map(|response| response.0)
    }
}

/// Transport answering from scripted responses.
///
/// A request is answered by the next response queued for its operation,
/// then by the next response queued with [`MockTransport::then`], then by
/// the fallback. With none of these it fails with a connection error.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<Script>,
}

impl MockTransport {
    /// Transport with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport answering every request with `response`.
    pub fn always(response: MockResponse) -> Self {
        let transport = Self::new();
        transport.script.lock().fallback = Some(response);
        transport
    }

    /// Queue a response for the next request of any operation.
    pub fn then(self, response: MockResponse) -> Self {
        self.script.lock().any.push_back(response);
        self
    }

    /// Queue a response for the next request of `operation`.
    pub fn on(self, operation: &str, response: MockResponse) -> Self {
        self.script
            .lock()
            .by_operation
            .entry(operation.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Requests sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script.lock().sent.clone()
    }

    /// Number of requests sent.
    pub fn request_count(&self) -> usize {
        self.script.lock().sent.len()
    }

    /// Most recent request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.script.lock().sent.last().cloned()
    }

    /// Operation names of the requests sent, in order.
    pub fn operations(&self) -> Vec<String> {
        self.script
            .lock()
            .sent
            .iter()
            .map(|request| operation_of(request).to_string())
            .collect()
    }
}

fn operation_of(request: &HttpRequest) -> &str {
    request
        .target()
        .and_then(|target| target.rsplit('.').next())
        .unwrap_or("")
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, LogsError> {
        let mut script = self.script.lock();
        let response = script.next(operation_of(&request));
        script.sent.push(request);

        response.ok_or_else(|| {
            LogsError::Network(NetworkError::ConnectionFailed {
                message: "no scripted response".to_string(),
            })
        })
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("requests", &self.request_count())
            .finish_non_exhaustive()
    }
}
