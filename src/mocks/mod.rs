//! Mock implementations for testing.
//!
//! [`MockLogsApi`] stands in for the remote service at the [`crate::api::LogsApi`]
//! seam; [`MockTransport`] and [`MockCredentialsProvider`] sit below
//! [`crate::api::HttpLogsClient`].

mod api;
mod credentials;
mod transport;

pub use api::{MockCall, MockFailure, MockLogsApi};
pub use credentials::MockCredentialsProvider;
pub use transport::{MockResponse, MockTransport};

use crate::types::LogDatum;
use chrono::{DateTime, TimeZone, Utc};

/// Test fixtures.
pub struct TestFixtures;

impl TestFixtures {
    /// A fixed instant, `2024-01-01T00:00:00Z` plus `offset_ms`.
    pub fn instant(offset_ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_704_067_200_000 + offset_ms)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// A record for `group:stream` stamped at [`TestFixtures::instant`].
    pub fn datum(message: &str, group: &str, stream: &str, offset_ms: i64) -> LogDatum {
        LogDatum::new(message, group, stream).with_timestamp(Self::instant(offset_ms))
    }

    /// `count` records for one destination, one millisecond apart.
    pub fn batch(group: &str, stream: &str, count: usize) -> Vec<LogDatum> {
        (0..count)
            .map(|i| Self::datum(&format!("message {}", i), group, stream, i as i64))
            .collect()
    }
}
