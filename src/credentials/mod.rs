//! AWS credentials used to sign CloudWatch Logs requests.
//!
//! Explicitly configured keys take priority; blank keys fall back to the
//! default chain (environment variables, then the shared profile file).

mod chain;
mod env;
mod explicit;
mod profile;

pub use chain::ChainCredentialsProvider;
pub use env::EnvCredentialsProvider;
pub use explicit::ExplicitCredentialsProvider;
pub use profile::ProfileCredentialsProvider;

use crate::error::LogsError;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

/// An access key pair, optionally with a session token.
///
/// Secrets are held as [`SecretString`] so `Debug` output never shows them.
#[derive(Clone, Debug)]
pub struct AwsCredentials {
    access_key_id: String,
    secret_access_key: SecretString,
    session_token: Option<SecretString>,
}

impl AwsCredentials {
    /// Long-term credentials.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::new(secret_access_key.into()),
            session_token: None,
        }
    }

    /// Temporary credentials carrying `session_token`.
    pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
        self.session_token = Some(SecretString::new(session_token.into()));
        self
    }

    /// Access key id.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Secret access key. Never log the result.
    pub fn secret_access_key(&self) -> &str {
        self.secret_access_key.expose_secret()
    }

    /// Session token, sent as `x-amz-security-token`.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token
            .as_ref()
            .map(|token| token.expose_secret().as_str())
    }
}

/// Source of AWS credentials.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Resolve credentials.
    async fn get_credentials(&self) -> Result<AwsCredentials, LogsError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
