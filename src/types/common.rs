//! Resource types shared by requests and responses.

use serde::{Deserialize, Serialize};

/// A log group as returned by `DescribeLogGroups`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogGroup {
    /// Group name.
    pub log_group_name: String,
    /// Creation time, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<i64>,
    /// Retention setting in days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_in_days: Option<i32>,
    /// Stored bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_bytes: Option<i64>,
    /// Group ARN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
}

impl LogGroup {
    /// A group with only its name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            log_group_name: name.into(),
            ..Default::default()
        }
    }
}

/// A log stream as returned by `DescribeLogStreams`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStream {
    /// Stream name.
    pub log_stream_name: String,
    /// Creation time, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<i64>,
    /// Timestamp of the first event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_event_timestamp: Option<i64>,
    /// Timestamp of the last event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event_timestamp: Option<i64>,
    /// Last ingestion time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ingestion_time: Option<i64>,
    /// Sequence token for the next append, absent for a stream never written to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_sequence_token: Option<String>,
    /// Stream ARN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
}

impl LogStream {
    /// A stream with only its name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            log_stream_name: name.into(),
            ..Default::default()
        }
    }

    /// Set the upload sequence token.
    pub fn with_upload_sequence_token(mut self, token: impl Into<String>) -> Self {
        self.upload_sequence_token = Some(token.into());
        self
    }
}

/// A single event in a `PutLogEvents` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLogEvent {
    /// Event time, epoch milliseconds.
    pub timestamp: i64,
    /// Event text.
    pub message: String,
}

/// Events the service accepted the call for but dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedLogEventsInfo {
    /// First index of events newer than the service accepts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub too_new_log_event_start_index: Option<i64>,
    /// Last index of events older than the service accepts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub too_old_log_event_end_index: Option<i64>,
    /// Last index of events older than the group's retention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired_log_event_end_index: Option<i64>,
}
