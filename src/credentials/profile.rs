//! Shared credentials file provider.

use super::{AwsCredentials, CredentialsProvider};
use crate::error::{CredentialsError, LogsError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

/// Default profile name.
pub const DEFAULT_PROFILE: &str = "default";

/// Profile selection variable.
pub const AWS_PROFILE: &str = "AWS_PROFILE";

/// Credentials file location override.
pub const AWS_SHARED_CREDENTIALS_FILE: &str = "AWS_SHARED_CREDENTIALS_FILE";

type Profiles = HashMap<String, HashMap<String, String>>;

/// Reads a profile from `~/.aws/credentials` (or `AWS_SHARED_CREDENTIALS_FILE`).
///
/// The profile is the one given to [`with_profile`](Self::with_profile),
/// else `AWS_PROFILE`, else `default`.
#[derive(Debug, Clone)]
pub struct ProfileCredentialsProvider {
    profile_name: String,
    credentials_file: Option<PathBuf>,
}

impl ProfileCredentialsProvider {
    /// Create a provider for `AWS_PROFILE` or the default profile.
    pub fn new() -> Self {
        Self::with_profile(
            std::env::var(AWS_PROFILE).unwrap_or_else(|_| DEFAULT_PROFILE.to_string()),
        )
    }

    /// Create a provider for a specific profile.
    pub fn with_profile(profile_name: impl Into<String>) -> Self {
        Self {
            profile_name: profile_name.into(),
            credentials_file: None,
        }
    }

    /// Read from a specific credentials file.
    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    fn credentials_file_path(&self) -> Option<PathBuf> {
        self.credentials_file
            .clone()
            .or_else(|| std::env::var(AWS_SHARED_CREDENTIALS_FILE).ok().map(PathBuf::from))
            .or_else(|| dirs::home_dir().map(|home| home.join(".aws").join("credentials")))
    }

    fn parse(content: &str) -> Profiles {
        let mut profiles = Profiles::new();
        let mut current: Option<String> = None;

        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = header.trim();
                let name = name.strip_prefix("profile ").unwrap_or(name).to_string();
                profiles.entry(name.clone()).or_default();
                current = Some(name);
            } else if let (Some(profile), Some((key, value))) = (&current, line.split_once('=')) {
                profiles
                    .entry(profile.clone())
                    .or_default()
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        profiles
    }

    fn profile_error(message: String) -> LogsError {
        LogsError::Credentials(CredentialsError::ProfileError { message })
    }
}

impl Default for ProfileCredentialsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialsProvider for ProfileCredentialsProvider {
    async fn get_credentials(&self) -> Result<AwsCredentials, LogsError> {
        let path = self
            .credentials_file_path()
            .ok_or_else(|| Self::profile_error("Cannot locate home directory".to_string()))?;

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            Self::profile_error(format!("Failed to read credentials file {:?}: {}", path, e))
        })?;

        let profiles = Self::parse(&content);
        let profile = profiles.get(&self.profile_name).ok_or_else(|| {
            Self::profile_error(format!("Profile '{}' not found", self.profile_name))
        })?;

        let field = |name: &str| {
            profile.get(name).ok_or_else(|| {
                Self::profile_error(format!(
                    "{} not found in profile '{}'",
                    name, self.profile_name
                ))
            })
        };

        let credentials =
            AwsCredentials::new(field("aws_access_key_id")?, field("aws_secret_access_key")?);
        Ok(match profile.get("aws_session_token") {
            Some(token) => credentials.with_session_token(token),
            None => credentials,
        })
    }

    fn name(&self) -> &'static str {
        "profile"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CREDENTIALS: &str = r#"
# shared credentials
[default]
aws_access_key_id = AKIADEFAULT
aws_secret_access_key = secretdefault

[profile logging]
; used by the log shipper
aws_access_key_id = AKIALOGS
aws_secret_access_key = secretlogs
aws_session_token = tokenlogs

[broken]
aws_access_key_id = AKIABROKEN
"#;

    fn credentials_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CREDENTIALS.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_profiles() {
        let profiles = ProfileCredentialsProvider::parse(CREDENTIALS);
        assert_eq!(profiles.len(), 3);
        assert_eq!(profiles["default"]["aws_access_key_id"], "AKIADEFAULT");
        assert_eq!(profiles["logging"]["aws_session_token"], "tokenlogs");
    }

    #[tokio::test]
    async fn test_named_profile() {
        let file = credentials_file();
        let provider =
            ProfileCredentialsProvider::with_profile("logging").with_credentials_file(file.path());

        let creds = provider.get_credentials().await.unwrap();
        assert_eq!(creds.access_key_id(), "AKIALOGS");
        assert_eq!(creds.session_token(), Some("tokenlogs"));
    }

    #[tokio::test]
    async fn test_missing_profile_or_key() {
        let file = credentials_file();

        let missing =
            ProfileCredentialsProvider::with_profile("absent").with_credentials_file(file.path());
        assert!(missing.get_credentials().await.is_err());

        let broken =
            ProfileCredentialsProvider::with_profile("broken").with_credentials_file(file.path());
        assert!(broken.get_credentials().await.is_err());
    }

    #[tokio::test]
    async fn test_unreadable_file() {
        let provider = ProfileCredentialsProvider::with_profile(DEFAULT_PROFILE)
            .with_credentials_file("/nonexistent/aws/credentials");
        assert!(matches!(
            provider.get_credentials().await,
            Err(LogsError::Credentials(CredentialsError::ProfileError { .. }))
        ));
    }
}
