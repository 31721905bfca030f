//! Wiring from configuration to a ready writer.

use crate::api::{HttpLogsClient, LogsApi};
use crate::config::LogsConfig;
use crate::destination::TokenCache;
use crate::emitter::LogEmitter;
use crate::error::LogsError;
use crate::transport::{HttpTransport, ReqwestTransport, TransportSettings};
use crate::writer::LogsWriter;
use std::sync::Arc;
use tracing::debug;

/// Builder for a [`LogsWriter`] talking to CloudWatch Logs.
///
/// By default the writer uses [`TokenCache::global`], so every writer in
/// the process coordinates on shared destinations.
pub struct LogsClientBuilder {
    config: Option<LogsConfig>,
    from_env: bool,
    transport: Option<Arc<dyn HttpTransport>>,
    api: Option<Arc<dyn LogsApi>>,
    cache: Option<TokenCache>,
}

impl LogsClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            from_env: false,
            transport: None,
            api: None,
            cache: None,
        }
    }

    /// Use the provided configuration.
    pub fn config(mut self, config: LogsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Use a custom HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Talk to this API instead of building an HTTP client.
    pub fn api(mut self, api: Arc<dyn LogsApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Use a private token cache instead of the process-wide one.
    pub fn token_cache(mut self, cache: TokenCache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn resolve_config(&mut self) -> Result<LogsConfig, LogsError> {
        if let Some(config) = self.config.take() {
            Ok(config)
        } else if self.from_env {
            LogsConfig::builder().from_env().build()
        } else {
            Ok(LogsConfig::default())
        }
    }

    fn resolve_api(&mut self, config: &LogsConfig) -> Result<Arc<dyn LogsApi>, LogsError> {
        if let Some(api) = self.api.take() {
            return Ok(api);
        }

        let transport = match self.transport.take() {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(TransportSettings::from(config))?),
        };
        let client = HttpLogsClient::from_config(config, transport)?;
        debug!(endpoint = %client.endpoint(), region = %config.region, "Created CloudWatch Logs client");
        Ok(Arc::new(client))
    }

    /// Build the writer. Must be called inside a tokio runtime.
    pub fn build(self) -> Result<LogsWriter, LogsError> {
        self.build_with_config().map(|(writer, _)| writer)
    }

    /// Build an emitter routing to the configured default group and stream.
    pub fn build_emitter(self) -> Result<LogEmitter, LogsError> {
        let (writer, config) = self.build_with_config()?;
        Ok(LogEmitter::from_config(Arc::new(writer), &config))
    }

    fn build_with_config(mut self) -> Result<(LogsWriter, LogsConfig), LogsError> {
        let config = self.resolve_config()?;
        let api = self.resolve_api(&config)?;
        let cache = self.cache.take().unwrap_or_else(TokenCache::global);
        let writer = LogsWriter::new(api, config.writer_settings(), cache);
        Ok((writer, config))
    }
}

impl Default for LogsClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LogsClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogsClientBuilder")
            .field("config", &self.config)
            .field("from_env", &self.from_env)
            .field("custom_transport", &self.transport.is_some())
            .field("custom_api", &self.api.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockCredentialsProvider, MockLogsApi, MockResponse, MockTransport};
    use crate::types::LogDatum;

    #[tokio::test]
    async fn test_builder_default() {
        let writer = LogsClientBuilder::new().build().unwrap();
        assert_eq!(writer.settings().retries, 5);
        writer.close().await;
    }

    #[tokio::test]
    async fn test_builder_with_config() {
        let config = LogsConfig::builder()
            .region("eu-west-1")
            .retries(1)
            .default_log_group("payments")
            .build()
            .unwrap();

        let emitter = LogsClientBuilder::new()
            .config(config)
            .api(Arc::new(MockLogsApi::new()))
            .token_cache(TokenCache::new())
            .build_emitter()
            .unwrap();

        assert_eq!(emitter.writer().settings().retries, 1);
        let datum = emitter.create_datum(&crate::emitter::LogRecord::new("m"));
        assert_eq!(datum.group_name, "payments");
    }

    #[tokio::test]
    async fn test_builder_with_transport() {
        let transport = Arc::new(MockTransport::always(MockResponse::json("{}")));
        let config = LogsConfig::builder()
            .credentials_provider(Arc::new(MockCredentialsProvider::new()))
            .retries(0)
            .build()
            .unwrap();

        let writer = LogsClientBuilder::new()
            .config(config)
            .transport(transport.clone())
            .token_cache(TokenCache::new())
            .build()
            .unwrap();

        writer
            .write(vec![LogDatum::new("hello", "g", "s")])
            .await
            .unwrap();

        assert_eq!(
            transport.operations(),
            vec![
                "DescribeLogGroups",
                "CreateLogGroup",
                "DescribeLogStreams",
                "CreateLogStream",
                "PutLogEvents"
            ]
        );
        let last = transport.last_request().unwrap();
        assert_eq!(last.target(), Some("Logs_20140328.PutLogEvents"));
        assert!(last.url.as_str().starts_with("https://logs.us-east-1.amazonaws.com"));
    }
}
