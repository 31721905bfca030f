//! Ordered provider chain with a resolve-once cache.

use super::{
    AwsCredentials, CredentialsProvider, EnvCredentialsProvider, ProfileCredentialsProvider,
};
use crate::error::{CredentialsError, LogsError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

/// Asks each provider in turn and keeps the first credentials found.
///
/// The default chain is environment variables, then `~/.aws/credentials`.
/// A failed resolution is not cached; the next call walks the chain again.
pub struct ChainCredentialsProvider {
    providers: Vec<Arc<dyn CredentialsProvider>>,
    resolved: OnceCell<AwsCredentials>,
}

impl ChainCredentialsProvider {
    /// Environment, then shared profile file.
    pub fn new() -> Self {
        Self::with_providers(vec![
            Arc::new(EnvCredentialsProvider::new()),
            Arc::new(ProfileCredentialsProvider::new()),
        ])
    }

    /// Chain over `providers`, asked in order.
    pub fn with_providers(providers: Vec<Arc<dyn CredentialsProvider>>) -> Self {
        Self {
            providers,
            resolved: OnceCell::new(),
        }
    }

    async fn resolve(&self) -> Result<AwsCredentials, LogsError> {
        let mut last_error = None;
        for provider in &self.providers {
            match provider.get_credentials().await {
                Ok(credentials) => {
                    debug!(provider = provider.name(), "Resolved AWS credentials");
                    return Ok(credentials);
                }
                Err(e) => {
                    trace!(provider = provider.name(), error = %e, "Credentials provider had nothing");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(LogsError::Credentials(CredentialsError::NotFound)))
    }
}

impl Default for ChainCredentialsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialsProvider for ChainCredentialsProvider {
    async fn get_credentials(&self) -> Result<AwsCredentials, LogsError> {
        self.resolved
            .get_or_try_init(|| self.resolve())
            .await
            .cloned()
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}

impl std::fmt::Debug for ChainCredentialsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("ChainCredentialsProvider")
            .field("providers", &names)
            .field("resolved", &self.resolved.initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockCredentialsProvider;

    #[tokio::test]
    async fn test_first_successful_provider_wins() {
        let failing = Arc::new(MockCredentialsProvider::failing());
        let second = Arc::new(MockCredentialsProvider::with_credentials(AwsCredentials::new(
            "SECOND", "SECRET",
        )));
        let third = Arc::new(MockCredentialsProvider::new());
        let chain =
            ChainCredentialsProvider::with_providers(vec![failing.clone(), second, third.clone()]);

        let creds = chain.get_credentials().await.unwrap();

        assert_eq!(creds.access_key_id(), "SECOND");
        assert_eq!(failing.call_count(), 1);
        assert_eq!(third.call_count(), 0);
    }

    #[tokio::test]
    async fn test_resolves_once() {
        let inner = Arc::new(MockCredentialsProvider::new());
        let chain = ChainCredentialsProvider::with_providers(vec![inner.clone()]);

        chain.get_credentials().await.unwrap();
        chain.get_credentials().await.unwrap();

        assert_eq!(inner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_retried_on_next_call() {
        let inner = Arc::new(MockCredentialsProvider::failing());
        let chain = ChainCredentialsProvider::with_providers(vec![inner.clone()]);

        assert!(chain.get_credentials().await.is_err());
        assert!(chain.get_credentials().await.is_err());
        assert_eq!(inner.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_chain_reports_not_found() {
        let chain = ChainCredentialsProvider::with_providers(Vec::new());
        assert!(matches!(
            chain.get_credentials().await,
            Err(LogsError::Credentials(CredentialsError::NotFound))
        ));
    }
}
