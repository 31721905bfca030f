//! AWS Signature V4 signer implementation.

use super::*;
use crate::credentials::CredentialsProvider;
use crate::error::LogsError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// A signed request ready to be sent.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// Target URL.
    pub url: Url,
    /// Headers to send, including `authorization`.
    pub headers: HashMap<String, String>,
}

/// Signs outgoing requests.
#[async_trait]
pub trait AwsSigner: Send + Sync {
    /// Sign a request.
    async fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &HashMap<String, String>,
        body: &[u8],
    ) -> Result<SignedRequest, LogsError>;
}

/// SigV4 signer pulling credentials from a provider on each request.
pub struct AwsSignerV4 {
    credentials_provider: Arc<dyn CredentialsProvider>,
    region: String,
    service: String,
}

impl AwsSignerV4 {
    /// Create a signer for the CloudWatch Logs service.
    pub fn new(credentials_provider: Arc<dyn CredentialsProvider>, region: impl Into<String>) -> Self {
        Self {
            credentials_provider,
            region: region.into(),
            service: LOGS_SERVICE.to_string(),
        }
    }

    /// Region requests are signed for.
    pub fn region(&self) -> &str {
        &self.region
    }
}

fn host_header(url: &Url) -> Result<String, LogsError> {
    let host = url.host_str().ok_or_else(|| {
        LogsError::Signing(SigningError::InvalidUrl {
            url: url.to_string(),
            message: "URL has no host".to_string(),
        })
    })?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[async_trait]
impl AwsSigner for AwsSignerV4 {
    async fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &HashMap<String, String>,
        body: &[u8],
    ) -> Result<SignedRequest, LogsError> {
        let credentials = self.credentials_provider.get_credentials().await?;
        let timestamp = Utc::now();
        let payload_hash = sha256_hex(body);

        let mut final_headers = headers.clone();
        final_headers.insert("host".to_string(), host_header(url)?);
        final_headers.insert("x-amz-date".to_string(), format_datetime(&timestamp));
        if let Some(token) = credentials.session_token() {
            final_headers.insert("x-amz-security-token".to_string(), token.to_string());
        }

        let signing_headers: Vec<(String, String)> = final_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let authorization = sign_request(
            &SigningParams {
                method,
                uri: url.path(),
                query_string: url.query().unwrap_or(""),
                headers: &signing_headers,
                payload_hash: &payload_hash,
                region: &self.region,
                service: &self.service,
                timestamp: &timestamp,
            },
            &credentials,
        )?;
        final_headers.insert("authorization".to_string(), authorization);

        Ok(SignedRequest {
            url: url.clone(),
            headers: final_headers,
        })
    }
}

impl std::fmt::Debug for AwsSignerV4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSignerV4")
            .field("credentials_provider", &self.credentials_provider.name())
            .field("region", &self.region)
            .field("service", &self.service)
            .finish()
    }
}
