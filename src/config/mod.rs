//! Configuration for the CloudWatch Logs writer.
//!
//! [`LogsConfig`] gathers region, endpoint, credentials, timeouts, retry
//! behavior and default destination names. It is resolved once, before a
//! writer is created, and never changes afterwards.

use crate::credentials::{ChainCredentialsProvider, CredentialsProvider, ExplicitCredentialsProvider};
use crate::error::{ConfigurationError, LogsError};
use crate::resilience::{ExponentialInterval, RetryPolicy, SharedIntervalProvider, TimeUnit, DEFAULT_RETRIES};
use crate::writer::WriterSettings;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Group and stream name used when a record names none.
pub const UNSPECIFIED: &str = "unspecified";

/// Configuration for the CloudWatch Logs client.
#[derive(Clone)]
pub struct LogsConfig {
    /// AWS region (e.g., "us-east-1").
    pub region: String,

    /// Custom endpoint URL (for local emulators or VPC endpoints).
    pub endpoint: Option<Url>,

    /// Credentials provider.
    pub credentials_provider: Arc<dyn CredentialsProvider>,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Read timeout for individual requests.
    pub read_timeout: Duration,

    /// Retries after the initial attempt of a unit of work.
    pub retries: u32,

    /// Base of the exponential backoff.
    pub backoff_base: f64,

    /// Unit the backoff is expressed in.
    pub backoff_unit: TimeUnit,

    /// Group used by emitters when a record names none.
    pub default_log_group: String,

    /// Stream used by emitters when a record names none.
    pub default_log_stream: String,
}

impl std::fmt::Debug for LogsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogsConfig")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("credentials_provider", &self.credentials_provider.name())
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("retries", &self.retries)
            .field("backoff_base", &self.backoff_base)
            .field("backoff_unit", &self.backoff_unit)
            .field("default_log_group", &self.default_log_group)
            .field("default_log_stream", &self.default_log_stream)
            .finish()
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint: None,
            credentials_provider: Arc::new(ChainCredentialsProvider::new()),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            retries: DEFAULT_RETRIES,
            backoff_base: 2.0,
            backoff_unit: TimeUnit::Seconds,
            default_log_group: UNSPECIFIED.to_string(),
            default_log_stream: UNSPECIFIED.to_string(),
        }
    }
}

impl LogsConfig {
    /// Create a new configuration builder.
    pub fn builder() -> LogsConfigBuilder {
        LogsConfigBuilder::default()
    }

    /// Resolve the endpoint URL requests are sent to.
    pub fn resolve_endpoint(&self) -> Result<Url, LogsError> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }

        let url = format!("https://logs.{}.amazonaws.com", self.region);
        Url::parse(&url).map_err(|e| {
            LogsError::Configuration(ConfigurationError::InvalidEndpoint {
                url,
                details: e.to_string(),
            })
        })
    }

    /// Backoff schedule for the configured base and unit.
    pub fn interval_provider(&self) -> SharedIntervalProvider {
        Arc::new(ExponentialInterval::new(self.backoff_base, self.backoff_unit))
    }

    /// Retry policy for the configured retries and backoff.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, self.interval_provider())
    }

    /// Settings for a [`crate::LogsWriter`].
    pub fn writer_settings(&self) -> WriterSettings {
        WriterSettings::new(self.retries, self.interval_provider())
    }
}

/// Builder for [`LogsConfig`].
#[derive(Default)]
pub struct LogsConfigBuilder {
    region: Option<String>,
    endpoint: Option<Url>,
    credentials_provider: Option<Arc<dyn CredentialsProvider>>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    retries: Option<u32>,
    backoff_base: Option<f64>,
    backoff_unit: Option<TimeUnit>,
    default_log_group: Option<String>,
    default_log_stream: Option<String>,
}

impl LogsConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the AWS region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set a custom endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Result<Self, LogsError> {
        let url_str = endpoint.into();
        let url = Url::parse(&url_str).map_err(|e| {
            LogsError::Configuration(ConfigurationError::InvalidEndpoint {
                url: url_str,
                details: e.to_string(),
            })
        })?;
        self.endpoint = Some(url);
        Ok(self)
    }

    /// Set a custom endpoint URL (infallible version).
    pub fn endpoint_url(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set the credentials provider.
    pub fn credentials_provider(mut self, provider: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials_provider = Some(provider);
        self
    }

    /// Use an explicit key pair, falling back to the default chain when
    /// either value is blank.
    pub fn credentials(self, access_key_id: &str, secret_access_key: &str) -> Self {
        self.credentials_provider(Arc::new(ExplicitCredentialsProvider::or_default(
            Some(access_key_id),
            Some(secret_access_key),
        )))
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the number of retries after the initial attempt.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Set the base of the exponential backoff.
    pub fn backoff_base(mut self, base: f64) -> Self {
        self.backoff_base = Some(base);
        self
    }

    /// Set the unit the backoff is expressed in.
    pub fn backoff_unit(mut self, unit: TimeUnit) -> Self {
        self.backoff_unit = Some(unit);
        self
    }

    /// Set the default log group.
    pub fn default_log_group(mut self, group: impl Into<String>) -> Self {
        self.default_log_group = Some(group.into());
        self
    }

    /// Set the default log stream.
    pub fn default_log_stream(mut self, stream: impl Into<String>) -> Self {
        self.default_log_stream = Some(stream.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Unparsable values are ignored.
    pub fn from_env(mut self) -> Self {
        if let Ok(region) = std::env::var("AWS_REGION") {
            self.region = Some(region);
        } else if let Ok(region) = std::env::var("AWS_DEFAULT_REGION") {
            self.region = Some(region);
        }

        if let Ok(endpoint) = std::env::var("AWS_ENDPOINT_URL_LOGS") {
            if let Ok(url) = Url::parse(&endpoint) {
                self.endpoint = Some(url);
            }
        } else if let Ok(endpoint) = std::env::var("AWS_ENDPOINT_URL") {
            if let Ok(url) = Url::parse(&endpoint) {
                self.endpoint = Some(url);
            }
        }

        if let Ok(val) = std::env::var("CLOUDWATCH_LOGS_RETRIES") {
            if let Ok(retries) = val.trim().parse() {
                self.retries = Some(retries);
            }
        }
        if let Ok(val) = std::env::var("CLOUDWATCH_LOGS_BACKOFF_BASE") {
            if let Ok(base) = val.trim().parse() {
                self.backoff_base = Some(base);
            }
        }
        if let Ok(val) = std::env::var("CLOUDWATCH_LOGS_BACKOFF_UNIT") {
            if let Ok(unit) = val.parse() {
                self.backoff_unit = Some(unit);
            }
        }
        if let Ok(group) = std::env::var("CLOUDWATCH_LOGS_GROUP") {
            self.default_log_group = Some(group);
        }
        if let Ok(stream) = std::env::var("CLOUDWATCH_LOGS_STREAM") {
            self.default_log_stream = Some(stream);
        }

        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<LogsConfig, LogsError> {
        let defaults = LogsConfig::default();

        let region = self.region.unwrap_or(defaults.region);
        if region.trim().is_empty() {
            return Err(LogsError::Configuration(ConfigurationError::MissingRegion));
        }

        let backoff_base = self.backoff_base.unwrap_or(defaults.backoff_base);
        if backoff_base.is_nan() || backoff_base < 1.0 {
            return Err(LogsError::Configuration(
                ConfigurationError::InvalidConfiguration {
                    field: "backoff_base".to_string(),
                    message: format!("Backoff base must be at least 1, got {}", backoff_base),
                },
            ));
        }

        let config = LogsConfig {
            region,
            endpoint: self.endpoint,
            credentials_provider: self
                .credentials_provider
                .unwrap_or(defaults.credentials_provider),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            read_timeout: self.read_timeout.unwrap_or(defaults.read_timeout),
            retries: self.retries.unwrap_or(defaults.retries),
            backoff_base,
            backoff_unit: self.backoff_unit.unwrap_or(defaults.backoff_unit),
            default_log_group: self
                .default_log_group
                .filter(|g| !g.trim().is_empty())
                .unwrap_or(defaults.default_log_group),
            default_log_stream: self
                .default_log_stream
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.default_log_stream),
        };
        config.resolve_endpoint()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockCredentialsProvider;
    use crate::resilience::IntervalProvider;

    #[test]
    fn test_default_config() {
        let config = LogsConfig::default();
        assert_eq!(config.region, "us-east-1");
        assert!(config.endpoint.is_none());
        assert_eq!(config.retries, 5);
        assert_eq!(config.backoff_base, 2.0);
        assert_eq!(config.backoff_unit, TimeUnit::Seconds);
        assert_eq!(config.default_log_group, "unspecified");
        assert_eq!(config.default_log_stream, "unspecified");
    }

    #[test]
    fn test_builder() {
        let config = LogsConfig::builder()
            .region("eu-west-1")
            .retries(2)
            .backoff_base(3.0)
            .backoff_unit(TimeUnit::Minutes)
            .default_log_group("payments")
            .build()
            .unwrap();

        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.retries, 2);
        assert_eq!(config.default_log_group, "payments");
        assert_eq!(config.default_log_stream, "unspecified");
        assert_eq!(
            config.interval_provider().get_interval(2),
            Duration::from_secs(9 * 60)
        );
        assert_eq!(config.retry_policy().retries(), 2);
    }

    #[test]
    fn test_rejects_empty_region() {
        let result = LogsConfig::builder().region("  ").build();
        assert!(matches!(
            result,
            Err(LogsError::Configuration(ConfigurationError::MissingRegion))
        ));
    }

    #[test]
    fn test_rejects_fractional_base() {
        for base in [0.5, 0.0, -2.0, f64::NAN] {
            let result = LogsConfig::builder().backoff_base(base).build();
            assert!(
                matches!(
                    result,
                    Err(LogsError::Configuration(ConfigurationError::InvalidConfiguration { .. }))
                ),
                "base {}",
                base
            );
        }
    }

    #[test]
    fn test_resolve_endpoint_default() {
        let config = LogsConfig::builder().region("ap-south-1").build().unwrap();
        assert_eq!(
            config.resolve_endpoint().unwrap().as_str(),
            "https://logs.ap-south-1.amazonaws.com/"
        );
    }

    #[test]
    fn test_resolve_endpoint_custom() {
        let config = LogsConfig::builder()
            .endpoint("http://localhost:4566")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            config.resolve_endpoint().unwrap().as_str(),
            "http://localhost:4566/"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(LogsConfig::builder().endpoint("not a url").is_err());
    }

    #[test]
    fn test_debug_omits_credentials() {
        let config = LogsConfig::builder()
            .credentials_provider(Arc::new(MockCredentialsProvider::new()))
            .build()
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("mock"));
        assert!(!debug.contains(MockCredentialsProvider::SECRET_ACCESS_KEY));
    }

    #[test]
    fn test_explicit_credentials() {
        let config = LogsConfig::builder().credentials("AKID", "SECRET").build().unwrap();
        assert_eq!(config.credentials_provider.name(), "explicit");
    }
}
