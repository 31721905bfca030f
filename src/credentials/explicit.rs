//! Explicit key/secret credentials with fallback.

use super::{AwsCredentials, ChainCredentialsProvider, CredentialsProvider};
use crate::error::LogsError;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::debug;

/// Returns the configured access key and secret when both are non-blank,
/// otherwise delegates to a fallback provider.
///
/// Construction never fails, whatever the inputs.
pub struct ExplicitCredentialsProvider {
    access_key_id: Option<String>,
    secret_access_key: Option<SecretString>,
    fallback: Arc<dyn CredentialsProvider>,
}

impl ExplicitCredentialsProvider {
    /// Create a provider with an explicit fallback.
    pub fn new(
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
        fallback: Arc<dyn CredentialsProvider>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.map(str::to_string),
            secret_access_key: secret_access_key.map(|s| SecretString::new(s.to_string())),
            fallback,
        }
    }

    /// Create a provider falling back to the default environment/profile chain.
    pub fn or_default(access_key_id: Option<&str>, secret_access_key: Option<&str>) -> Self {
        Self::new(
            access_key_id,
            secret_access_key,
            Arc::new(ChainCredentialsProvider::new()),
        )
    }

    fn explicit(&self) -> Option<AwsCredentials> {
        let key = self.access_key_id.as_deref().filter(|k| !is_blank(k))?;
        let secret = self
            .secret_access_key
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !is_blank(s))?;
        Some(AwsCredentials::new(key, secret))
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[async_trait]
impl CredentialsProvider for ExplicitCredentialsProvider {
    async fn get_credentials(&self) -> Result<AwsCredentials, LogsError> {
        match self.explicit() {
            Some(credentials) => Ok(credentials),
            None => {
                debug!(
                    fallback = self.fallback.name(),
                    "No explicit access key and secret, using fallback provider"
                );
                self.fallback.get_credentials().await
            }
        }
    }

    fn name(&self) -> &'static str {
        "explicit"
    }
}

impl std::fmt::Debug for ExplicitCredentialsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplicitCredentialsProvider")
            .field("access_key_id", &self.access_key_id)
            .field("fallback", &self.fallback.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockCredentialsProvider;
    use test_case::test_case;

    #[test_case(None, None ; "both missing")]
    #[test_case(Some(""), Some("") ; "both empty")]
    #[test_case(Some("  "), Some("\t") ; "both whitespace")]
    #[test_case(Some("AKID"), None ; "secret missing")]
    #[test_case(Some("AKID"), Some("") ; "secret empty")]
    #[test_case(Some("AKID"), Some("   ") ; "secret whitespace")]
    #[test_case(None, Some("SECRET") ; "key missing")]
    #[test_case(Some(""), Some("SECRET") ; "key empty")]
    #[test_case(Some(" "), Some("SECRET") ; "key whitespace")]
    #[tokio::test]
    async fn test_blank_values_use_fallback(key: Option<&str>, secret: Option<&str>) {
        let fallback = Arc::new(MockCredentialsProvider::new());
        let provider = ExplicitCredentialsProvider::new(key, secret, fallback.clone());

        let creds = provider.get_credentials().await.unwrap();

        assert_eq!(fallback.call_count(), 1);
        assert_eq!(creds.access_key_id(), MockCredentialsProvider::ACCESS_KEY_ID);
    }

    #[tokio::test]
    async fn test_explicit_values_skip_fallback() {
        let fallback = Arc::new(MockCredentialsProvider::new());
        let provider =
            ExplicitCredentialsProvider::new(Some("AKID"), Some("SECRET"), fallback.clone());

        let creds = provider.get_credentials().await.unwrap();

        assert_eq!(fallback.call_count(), 0);
        assert_eq!(creds.access_key_id(), "AKID");
        assert_eq!(creds.secret_access_key(), "SECRET");
    }

    #[test]
    fn test_debug_hides_secret() {
        let provider = ExplicitCredentialsProvider::new(
            Some("AKID"),
            Some("TOPSECRET"),
            Arc::new(MockCredentialsProvider::new()),
        );
        assert!(!format!("{:?}", provider).contains("TOPSECRET"));
    }
}
