//! Environment variable credentials provider.

use super::{AwsCredentials, CredentialsProvider};
use crate::error::{CredentialsError, LogsError};
use async_trait::async_trait;
use std::env;

/// Access key ID variable.
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// Secret access key variable.
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Session token variable.
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and the optional
/// `AWS_SESSION_TOKEN`.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialsProvider {
    _private: (),
}

impl EnvCredentialsProvider {
    /// Create a new environment credentials provider.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(name: &str) -> Result<String, LogsError> {
        match env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            Ok(_) => Err(LogsError::Credentials(CredentialsError::Invalid {
                message: format!("{} is empty", name),
            })),
            Err(_) => Err(LogsError::Credentials(CredentialsError::NotFound)),
        }
    }
}

#[async_trait]
impl CredentialsProvider for EnvCredentialsProvider {
    async fn get_credentials(&self) -> Result<AwsCredentials, LogsError> {
        let access_key_id = Self::read(AWS_ACCESS_KEY_ID)?;
        let secret_access_key = Self::read(AWS_SECRET_ACCESS_KEY)?;

        let credentials = AwsCredentials::new(access_key_id, secret_access_key);
        Ok(match env::var(AWS_SESSION_TOKEN) {
            Ok(token) if !token.is_empty() => credentials.with_session_token(token),
            _ => credentials,
        })
    }

    fn name(&self) -> &'static str {
        "environment"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the process environment is not mutated concurrently.
    #[tokio::test]
    async fn test_env_provider() {
        let saved: Vec<_> = [AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN]
            .iter()
            .map(|k| (*k, env::var(k).ok()))
            .collect();
        let provider = EnvCredentialsProvider::new();

        env::remove_var(AWS_ACCESS_KEY_ID);
        env::remove_var(AWS_SECRET_ACCESS_KEY);
        env::remove_var(AWS_SESSION_TOKEN);
        assert!(provider.get_credentials().await.is_err());

        env::set_var(AWS_ACCESS_KEY_ID, "AKIDENV");
        env::set_var(AWS_SECRET_ACCESS_KEY, " ");
        assert!(provider.get_credentials().await.is_err());

        env::set_var(AWS_SECRET_ACCESS_KEY, "SECRETENV");
        env::set_var(AWS_SESSION_TOKEN, "TOKENENV");
        let creds = provider.get_credentials().await.unwrap();
        assert_eq!(creds.access_key_id(), "AKIDENV");
        assert_eq!(creds.session_token(), Some("TOKENENV"));

        for (key, value) in saved {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}
