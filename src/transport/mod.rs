//! HTTP transport for the CloudWatch Logs JSON protocol.
//!
//! Every service call is a signed `POST` of a JSON document to the regional
//! endpoint. [`HttpTransport`] is the seam between [`crate::api::HttpLogsClient`]
//! and the network; tests substitute [`crate::mocks::MockTransport`].

use crate::config::LogsConfig;
use crate::error::{LogsError, NetworkError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Signed request bound for the service endpoint.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Endpoint URL.
    pub url: Url,
    /// Headers, including the signature.
    pub headers: HashMap<String, String>,
    /// JSON payload.
    pub body: Bytes,
}

impl HttpRequest {
    /// `POST` of `body` to `url`.
    pub fn post(url: Url, body: impl Into<Bytes>) -> Self {
        Self {
            url,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Merge `headers` into the request.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Header value, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup(&self.headers, name)
    }

    /// The `x-amz-target` operation, e.g. `Logs_20140328.PutLogEvents`.
    pub fn target(&self) -> Option<&str> {
        self.header("x-amz-target")
    }
}

/// Raw service response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response payload, possibly empty.
    pub body: Bytes,
}

impl HttpResponse {
    /// Response without headers.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header value, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup(&self.headers, name)
    }

    /// Request id assigned by the service.
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-amzn-requestid")
    }
}

fn lookup<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find_map(|(key, value)| key.eq_ignore_ascii_case(name).then_some(value.as_str()))
}

/// Sends requests to the service.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and return whatever the service answered.
    ///
    /// Only failures to obtain a response are errors; non-2xx statuses are
    /// returned as responses.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, LogsError>;
}

/// Connection settings for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,
    /// Time allowed for a whole request.
    pub read_timeout: Duration,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            user_agent: format!("aws-cloudwatch-logs-integration/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&LogsConfig> for TransportSettings {
    fn from(config: &LogsConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
            read_timeout: config.read_timeout,
            ..Self::default()
        }
    }
}

/// [`HttpTransport`] backed by a pooled `reqwest` client.
pub struct ReqwestTransport {
    client: reqwest::Client,
    settings: TransportSettings,
}

impl ReqwestTransport {
    /// Create a transport.
    pub fn new(settings: TransportSettings) -> Result<Self, LogsError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.read_timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| {
                LogsError::Network(NetworkError::TlsError {
                    message: e.to_string(),
                })
            })?;
        Ok(Self { client, settings })
    }

    /// Settings the transport was built with.
    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    fn network_error(&self, error: reqwest::Error) -> LogsError {
        let network = if error.is_timeout() {
            NetworkError::Timeout {
                duration: self.settings.read_timeout,
            }
        } else {
            NetworkError::ConnectionFailed {
                message: error.to_string(),
            }
        };
        LogsError::Network(network)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, LogsError> {
        let mut builder = self.client.post(request.url);
        for (name, value) in &request.headers {
            // reqwest sets Host itself
            if !name.eq_ignore_ascii_case("host") {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(|e| self.network_error(e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
