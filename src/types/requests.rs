//! Request bodies for the CloudWatch Logs JSON protocol.

use super::InputLogEvent;
use serde::Serialize;

/// `DescribeLogGroups` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeLogGroupsRequest {
    /// Only groups whose name starts with this prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_group_name_prefix: Option<String>,
    /// Pagination token from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl DescribeLogGroupsRequest {
    /// Describe groups matching a name prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            log_group_name_prefix: Some(prefix.into()),
            next_token: None,
        }
    }
}

/// `CreateLogGroup` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogGroupRequest {
    /// Name of the group to create.
    pub log_group_name: String,
}

impl CreateLogGroupRequest {
    /// Create a request.
    pub fn new(log_group_name: impl Into<String>) -> Self {
        Self {
            log_group_name: log_group_name.into(),
        }
    }
}

/// `DescribeLogStreams` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeLogStreamsRequest {
    /// Group to list streams of.
    pub log_group_name: String,
    /// Only streams whose name starts with this prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_stream_name_prefix: Option<String>,
    /// Pagination token from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl DescribeLogStreamsRequest {
    /// Describe streams of a group matching a name prefix.
    pub fn with_prefix(log_group_name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            log_group_name: log_group_name.into(),
            log_stream_name_prefix: Some(prefix.into()),
            next_token: None,
        }
    }
}

/// `CreateLogStream` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogStreamRequest {
    /// Owning group.
    pub log_group_name: String,
    /// Name of the stream to create.
    pub log_stream_name: String,
}

impl CreateLogStreamRequest {
    /// Create a request.
    pub fn new(log_group_name: impl Into<String>, log_stream_name: impl Into<String>) -> Self {
        Self {
            log_group_name: log_group_name.into(),
            log_stream_name: log_stream_name.into(),
        }
    }
}

/// `PutLogEvents` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogEventsRequest {
    /// Target group.
    pub log_group_name: String,
    /// Target stream.
    pub log_stream_name: String,
    /// Events in ascending timestamp order.
    pub log_events: Vec<InputLogEvent>,
    /// Token from the previous append; absent for a fresh stream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_token: Option<String>,
}
