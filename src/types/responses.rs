//! Response bodies for the CloudWatch Logs JSON protocol.
//!
//! Every response carries the HTTP status it arrived with so callers can
//! verify it; the status is not part of the JSON body.

use super::{LogGroup, LogStream, RejectedLogEventsInfo};
use crate::api::StatusCode;
use serde::Deserialize;

macro_rules! impl_status_code {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl StatusCode for $ty {
                fn status_code(&self) -> u16 {
                    self.status_code
                }
            }
        )+
    };
}

/// `DescribeLogGroups` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeLogGroupsResponse {
    /// HTTP status code.
    #[serde(skip)]
    pub status_code: u16,
    /// Matching groups.
    #[serde(default)]
    pub log_groups: Vec<LogGroup>,
    /// Token for the next page.
    #[serde(default)]
    pub next_token: Option<String>,
}

/// `CreateLogGroup` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateLogGroupResponse {
    /// HTTP status code.
    #[serde(skip)]
    pub status_code: u16,
}

/// `DescribeLogStreams` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeLogStreamsResponse {
    /// HTTP status code.
    #[serde(skip)]
    pub status_code: u16,
    /// Matching streams.
    #[serde(default)]
    pub log_streams: Vec<LogStream>,
    /// Token for the next page.
    #[serde(default)]
    pub next_token: Option<String>,
}

/// `CreateLogStream` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateLogStreamResponse {
    /// HTTP status code.
    #[serde(skip)]
    pub status_code: u16,
}

/// `PutLogEvents` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogEventsResponse {
    /// HTTP status code.
    #[serde(skip)]
    pub status_code: u16,
    /// Token to send with the next append.
    #[serde(default)]
    pub next_sequence_token: Option<String>,
    /// Events dropped by the service.
    #[serde(default)]
    pub rejected_log_events_info: Option<RejectedLogEventsInfo>,
}

impl_status_code!(
    DescribeLogGroupsResponse,
    CreateLogGroupResponse,
    DescribeLogStreamsResponse,
    CreateLogStreamResponse,
    PutLogEventsResponse,
);
