//! Signed HTTP implementation of [`LogsApi`].

use super::{operations, LogsApi};
use crate::config::LogsConfig;
use crate::error::{map_service_error, parse_error_response, LogsError};
use crate::signing::{AwsSigner, AwsSignerV4};
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::*;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

const TARGET_PREFIX: &str = "Logs_20140328";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// CloudWatch Logs client speaking the JSON 1.1 protocol.
///
/// Non-2xx responses with a service error body become typed errors.
/// Non-2xx responses without one are returned as an empty response
/// carrying the status, for the caller's verification to reject.
pub struct HttpLogsClient {
    endpoint: Url,
    transport: Arc<dyn HttpTransport>,
    signer: Arc<dyn AwsSigner>,
}

impl HttpLogsClient {
    /// Create a client.
    pub fn new(endpoint: Url, transport: Arc<dyn HttpTransport>, signer: Arc<dyn AwsSigner>) -> Self {
        Self {
            endpoint,
            transport,
            signer,
        }
    }

    /// Create a client for a configuration, signing with its credentials.
    pub fn from_config(
        config: &LogsConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, LogsError> {
        let signer = Arc::new(AwsSignerV4::new(
            config.credentials_provider.clone(),
            config.region.clone(),
        ));
        Ok(Self::new(config.resolve_endpoint()?, transport, signer))
    }

    /// Endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<(u16, Resp), LogsError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned + Default,
    {
        let body = serde_json::to_vec(request)?;

        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), CONTENT_TYPE.to_string());
        headers.insert(
            "x-amz-target".to_string(),
            format!("{}.{}", TARGET_PREFIX, operation),
        );

        let signed = self
            .signer
            .sign("POST", &self.endpoint, &headers, &body)
            .await?;
        let http_request = HttpRequest::post(signed.url, body).with_headers(signed.headers);

        trace!(operation, "Sending CloudWatch Logs request");
        let response = self.transport.send(http_request).await?;
        let status = response.status;

        if !response.is_success() {
            return match parse_error_response(&response.body) {
                Ok(mut parsed) => {
                    parsed.request_id = response.request_id().map(String::from);
                    debug!(
                        operation,
                        status,
                        code = %parsed.error_type,
                        "CloudWatch Logs request rejected"
                    );
                    Err(map_service_error(parsed))
                }
                Err(_) => {
                    debug!(operation, status, "CloudWatch Logs request failed without error body");
                    Ok((status, Resp::default()))
                }
            };
        }

        let parsed = if response.body.is_empty() {
            Resp::default()
        } else {
            serde_json::from_slice(&response.body)?
        };
        Ok((status, parsed))
    }
}

#[async_trait]
impl LogsApi for HttpLogsClient {
    async fn describe_log_groups(
        &self,
        request: DescribeLogGroupsRequest,
    ) -> Result<DescribeLogGroupsResponse, LogsError> {
        let (status_code, response): (u16, DescribeLogGroupsResponse) =
            self.call(operations::DESCRIBE_LOG_GROUPS, &request).await?;
        Ok(DescribeLogGroupsResponse {
            status_code,
            ..response
        })
    }

    async fn create_log_group(
        &self,
        request: CreateLogGroupRequest,
    ) -> Result<CreateLogGroupResponse, LogsError> {
        let (status_code, _): (u16, CreateLogGroupResponse) =
            self.call(operations::CREATE_LOG_GROUP, &request).await?;
        Ok(CreateLogGroupResponse { status_code })
    }

    async fn describe_log_streams(
        &self,
        request: DescribeLogStreamsRequest,
    ) -> Result<DescribeLogStreamsResponse, LogsError> {
        let (status_code, response): (u16, DescribeLogStreamsResponse) =
            self.call(operations::DESCRIBE_LOG_STREAMS, &request).await?;
        Ok(DescribeLogStreamsResponse {
            status_code,
            ..response
        })
    }

    async fn create_log_stream(
        &self,
        request: CreateLogStreamRequest,
    ) -> Result<CreateLogStreamResponse, LogsError> {
        let (status_code, _): (u16, CreateLogStreamResponse) =
            self.call(operations::CREATE_LOG_STREAM, &request).await?;
        Ok(CreateLogStreamResponse { status_code })
    }

    async fn put_log_events(
        &self,
        request: PutLogEventsRequest,
    ) -> Result<PutLogEventsResponse, LogsError> {
        let (status_code, response): (u16, PutLogEventsResponse) =
            self.call(operations::PUT_LOG_EVENTS, &request).await?;
        Ok(PutLogEventsResponse {
            status_code,
            ..response
        })
    }
}

impl std::fmt::Debug for HttpLogsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLogsClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Verify;
    use crate::mocks::{MockCredentialsProvider, MockResponse, MockTransport};

    fn client(transport: Arc<MockTransport>) -> HttpLogsClient {
        let signer = Arc::new(AwsSignerV4::new(
            Arc::new(MockCredentialsProvider::new()),
            "us-east-1",
        ));
        HttpLogsClient::new(
            Url::parse("https://logs.us-east-1.amazonaws.com").unwrap(),
            transport,
            signer,
        )
    }

    #[tokio::test]
    async fn test_request_carries_target_and_signature() {
        let transport = Arc::new(MockTransport::new().then(MockResponse::json(
            r#"{"logGroups":[{"logGroupName":"app"}]}"#,
        )));
        let response = client(transport.clone())
            .describe_log_groups(DescribeLogGroupsRequest::with_prefix("app"))
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(response.log_groups, vec![LogGroup::named("app")]);

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.target(), Some("Logs_20140328.DescribeLogGroups"));
        assert_eq!(sent.header("content-type"), Some(CONTENT_TYPE));
        assert!(sent.header("authorization").is_some());
        let body: serde_json::Value = serde_json::from_slice(&sent.body).unwrap();
        assert_eq!(body["logGroupNamePrefix"], "app");
    }

    #[tokio::test]
    async fn test_empty_success_body() {
        let transport = Arc::new(MockTransport::new().then(MockResponse::empty()));
        let response = client(transport)
            .create_log_group(CreateLogGroupRequest::new("app"))
            .await
            .unwrap();
        assert_eq!(response.status_code, 200);
    }

    #[tokio::test]
    async fn test_invalid_sequence_token_is_stale_token() {
        let transport = Arc::new(MockTransport::new().on(
            operations::PUT_LOG_EVENTS,
            MockResponse::status(
                400,
                r#"{"__type":"InvalidSequenceTokenException","expectedSequenceToken":"7","message":"The given sequenceToken is invalid."}"#,
            ),
        ));
        let result = client(transport)
            .put_log_events(PutLogEventsRequest {
                log_group_name: "g".to_string(),
                log_stream_name: "s".to_string(),
                log_events: Vec::new(),
                sequence_token: Some("6".to_string()),
            })
            .await;

        match result {
            Err(LogsError::StaleToken { expected_token, .. }) => {
                assert_eq!(expected_token.as_deref(), Some("7"))
            }
            other => panic!("Expected StaleToken, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_service_exception_keeps_request_id() {
        let transport = Arc::new(MockTransport::new().then(
            MockResponse::status(400, r#"{"__type":"ThrottlingException","message":"Rate exceeded"}"#)
                .with_request_id("req-9"),
        ));
        let err = client(transport)
            .describe_log_streams(DescribeLogStreamsRequest::with_prefix("g", "s"))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(err.request_id(), Some("req-9"));
    }

    #[tokio::test]
    async fn test_bare_failure_status_is_left_for_verification() {
        let transport = Arc::new(MockTransport::new().then(MockResponse::status(503, "Service Unavailable")));
        let response = client(transport)
            .create_log_stream(CreateLogStreamRequest::new("g", "s"))
            .await
            .unwrap();

        assert_eq!(response.status_code, 503);
        assert!(matches!(
            response.verify_named(operations::CREATE_LOG_STREAM),
            Err(LogsError::FailedRequest { status_code: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_network_errors_propagate() {
        let transport = Arc::new(MockTransport::new());
        let err = client(transport)
            .create_log_group(CreateLogGroupRequest::new("g"))
            .await
            .unwrap_err();
        assert!(matches!(err, LogsError::Network(_)));
    }
}
