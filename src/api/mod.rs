//! The remote CloudWatch Logs API.
//!
//! [`LogsApi`] is the seam the resolver and writer talk to.
//! [`HttpLogsClient`] implements it over signed HTTP; tests use
//! [`crate::mocks::MockLogsApi`].

mod http;
mod verify;

pub use http::HttpLogsClient;
pub use verify::{is_successful, StatusCode, Verify};

use crate::error::LogsError;
use crate::types::*;
use async_trait::async_trait;

/// Operation names as they appear in `X-Amz-Target` and in errors.
pub mod operations {
    /// `DescribeLogGroups`
    pub const DESCRIBE_LOG_GROUPS: &str = "DescribeLogGroups";
    /// `CreateLogGroup`
    pub const CREATE_LOG_GROUP: &str = "CreateLogGroup";
    /// `DescribeLogStreams`
    pub const DESCRIBE_LOG_STREAMS: &str = "DescribeLogStreams";
    /// `CreateLogStream`
    pub const CREATE_LOG_STREAM: &str = "CreateLogStream";
    /// `PutLogEvents`
    pub const PUT_LOG_EVENTS: &str = "PutLogEvents";
}

/// Remote append API.
///
/// Responses carry their status code; callers check it with [`Verify`].
/// `put_log_events` reports an out-of-date token as
/// [`LogsError::StaleToken`].
#[async_trait]
pub trait LogsApi: Send + Sync {
    /// List groups by name prefix.
    async fn describe_log_groups(
        &self,
        request: DescribeLogGroupsRequest,
    ) -> Result<DescribeLogGroupsResponse, LogsError>;

    /// Create a group.
    async fn create_log_group(
        &self,
        request: CreateLogGroupRequest,
    ) -> Result<CreateLogGroupResponse, LogsError>;

    /// List streams of a group by name prefix.
    async fn describe_log_streams(
        &self,
        request: DescribeLogStreamsRequest,
    ) -> Result<DescribeLogStreamsResponse, LogsError>;

    /// Create a stream.
    async fn create_log_stream(
        &self,
        request: CreateLogStreamRequest,
    ) -> Result<CreateLogStreamResponse, LogsError>;

    /// Append events to a stream.
    async fn put_log_events(
        &self,
        request: PutLogEventsRequest,
    ) -> Result<PutLogEventsResponse, LogsError>;
}
