//! AWS CloudWatch Logs Integration Module
//!
//! Ships application log events to CloudWatch Logs reliably and in order.
//!
//! # Features
//!
//! - **Ordering**: per-writer FIFO queue, events sorted by timestamp per request
//! - **Sequence tokens**: resolved lazily, shared across writers, repaired when stale
//! - **Provisioning**: missing log groups and streams are created on first use
//! - **Resilience**: retry with configurable exponential backoff
//! - **tracing**: a `tracing_subscriber` layer forwarding events
//! - **AWS Signature V4**: signed JSON 1.1 requests
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use aws_cloudwatch_logs::LogDatum;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), aws_cloudwatch_logs::LogsError> {
//!     let writer = aws_cloudwatch_logs::create_writer_from_env()?;
//!
//!     writer
//!         .write(vec![LogDatum::new("service started", "my-app", "instance-1")])
//!         .await?;
//!
//!     writer.close().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod client;
pub mod config;
pub mod credentials;
pub mod destination;
pub mod emitter;
pub mod error;
pub mod mocks;
pub mod resilience;
pub mod signing;
pub mod transport;
pub mod types;
pub mod writer;

// Re-export main types at crate root
pub use api::{HttpLogsClient, LogsApi, StatusCode, Verify};
pub use client::LogsClientBuilder;
pub use config::{LogsConfig, LogsConfigBuilder};
pub use credentials::{
    AwsCredentials, ChainCredentialsProvider, CredentialsProvider, EnvCredentialsProvider,
    ExplicitCredentialsProvider, ProfileCredentialsProvider,
};
pub use destination::{DestinationResolver, TokenCache};
pub use emitter::{Layout, LogEmitter, LogRecord, PlainLayout};
pub use error::{
    ConfigurationError, CredentialsError, LogsError, NetworkError, ResponseError, SigningError,
};
pub use resilience::{ExponentialInterval, IntervalProvider, RetryPolicy, TimeUnit};
pub use signing::{AwsSigner, AwsSignerV4};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportSettings};
pub use types::{DestinationKey, InputLogEvent, LogDatum};
pub use writer::{LogsWriter, WriteCompletion, WriterSettings};

/// Create a writer configured from environment variables.
///
/// This will attempt to read configuration from:
/// - `AWS_REGION` / `AWS_DEFAULT_REGION` for region
/// - `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY` for credentials
/// - `AWS_ENDPOINT_URL_LOGS` / `AWS_ENDPOINT_URL` for custom endpoints
/// - `CLOUDWATCH_LOGS_RETRIES`, `CLOUDWATCH_LOGS_BACKOFF_BASE` and
///   `CLOUDWATCH_LOGS_BACKOFF_UNIT` for retry behavior
///
/// Must be called inside a tokio runtime.
pub fn create_writer_from_env() -> Result<LogsWriter> {
    LogsClientBuilder::new().from_env().build()
}

/// Create a writer with explicit configuration.
///
/// # Example
///
/// ```rust,no_run
/// use aws_cloudwatch_logs::LogsConfig;
///
/// # async fn run() -> aws_cloudwatch_logs::Result<()> {
/// let config = LogsConfig::builder()
///     .region("us-west-2")
///     .credentials("AKID", "SECRET")
///     .retries(3)
///     .build()?;
///
/// let writer = aws_cloudwatch_logs::create_writer(config)?;
/// # Ok(())
/// # }
/// ```
pub fn create_writer(config: LogsConfig) -> Result<LogsWriter> {
    LogsClientBuilder::new().config(config).build()
}

/// Result type alias for CloudWatch Logs operations.
pub type Result<T> = std::result::Result<T, LogsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        let _ = std::any::type_name::<LogsError>();
        let _ = std::any::type_name::<LogsConfig>();
        let _ = std::any::type_name::<LogsWriter>();
        let _ = std::any::type_name::<TokenCache>();
        let _ = std::any::type_name::<LogDatum>();
        let _ = std::any::type_name::<LogEmitter>();
    }
}
