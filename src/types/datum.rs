//! Log records as handed to the writer.

use super::InputLogEvent;
use chrono::{DateTime, Utc};
use std::fmt;

/// A (group, stream) pair identifying an append target.
///
/// Used as the key for sequence-token lookup. Displays as `group:stream`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DestinationKey {
    group: String,
    stream: String,
}

impl DestinationKey {
    /// Create a destination key.
    pub fn new(group: impl Into<String>, stream: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            stream: stream.into(),
        }
    }

    /// Log group name.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Log stream name.
    pub fn stream(&self) -> &str {
        &self.stream
    }
}

impl fmt::Display for DestinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.stream)
    }
}

/// One log record to ship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDatum {
    /// Rendered message text.
    pub message: String,
    /// Target log group.
    pub group_name: String,
    /// Target log stream.
    pub stream_name: String,
    /// Event time; the capture time is used when absent.
    pub timestamp: Option<DateTime<Utc>>,
    captured_at: DateTime<Utc>,
}

impl LogDatum {
    /// Capture a record now, without an explicit event time.
    pub fn new(
        message: impl Into<String>,
        group_name: impl Into<String>,
        stream_name: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            group_name: group_name.into(),
            stream_name: stream_name.into(),
            timestamp: None,
            captured_at: Utc::now(),
        }
    }

    /// Set the event time.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Destination this record is routed to.
    pub fn destination(&self) -> DestinationKey {
        DestinationKey::new(self.group_name.as_str(), self.stream_name.as_str())
    }

    /// Event time, falling back to the capture time.
    pub fn effective_timestamp(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or(self.captured_at)
    }

    /// Convert to the wire representation.
    pub fn to_input_event(&self) -> InputLogEvent {
        InputLogEvent {
            timestamp: self.effective_timestamp().timestamp_millis(),
            message: self.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_destination_display() {
        let datum = LogDatum::new("hello", "payments", "api-1");
        assert_eq!(datum.destination().to_string(), "payments:api-1");
        assert_eq!(datum.destination(), DestinationKey::new("payments", "api-1"));
    }

    #[test]
    fn test_explicit_timestamp_wins() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let event = LogDatum::new("m", "g", "s").with_timestamp(ts).to_input_event();
        assert_eq!(event.timestamp, ts.timestamp_millis());
        assert_eq!(event.message, "m");
    }

    #[test]
    fn test_missing_timestamp_uses_capture_time() {
        let before = Utc::now();
        let datum = LogDatum::new("m", "g", "s");
        let after = Utc::now();

        let ts = datum.effective_timestamp();
        assert!(ts >= before && ts <= after);
        // stable across conversions
        assert_eq!(datum.to_input_event().timestamp, datum.to_input_event().timestamp);
    }
}
