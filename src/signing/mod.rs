//! AWS Signature V4 signing for CloudWatch Logs requests.

mod canonical;
mod signer;

pub use signer::{AwsSigner, AwsSignerV4, SignedRequest};

use crate::credentials::AwsCredentials;
use crate::error::SigningError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// AWS Signature V4 algorithm identifier.
pub const AWS_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Signing name of the CloudWatch Logs service.
pub const LOGS_SERVICE: &str = "logs";

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// HMAC-SHA256 of `data` keyed with `key`.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| SigningError::CalculationFailed {
            message: e.to_string(),
        })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Derive the SigV4 signing key.
///
/// kDate = HMAC("AWS4" + secret, date), then region, service and "aws4_request".
pub fn derive_signing_key(
    secret_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, SigningError> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

/// `{date}/{region}/{service}/aws4_request`
pub fn build_credential_scope(date_stamp: &str, region: &str, service: &str) -> String {
    format!("{}/{}/{}/aws4_request", date_stamp, region, service)
}

/// Format a timestamp as `YYYYMMDD'T'HHMMSS'Z'`.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Format a timestamp as `YYYYMMDD`.
pub fn format_date_stamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%d").to_string()
}

/// Check if a header takes part in the signature.
pub fn should_sign_header(header_name: &str) -> bool {
    let name = header_name.to_lowercase();
    name == "host" || name == "content-type" || name.starts_with("x-amz-")
}

/// Everything that identifies a request for signing.
#[derive(Debug, Clone, Copy)]
pub struct SigningParams<'a> {
    /// HTTP method.
    pub method: &'a str,
    /// URI path.
    pub uri: &'a str,
    /// Raw query string.
    pub query_string: &'a str,
    /// Headers to consider for signing.
    pub headers: &'a [(String, String)],
    /// Hex SHA-256 of the body.
    pub payload_hash: &'a str,
    /// Region to sign for.
    pub region: &'a str,
    /// Service signing name.
    pub service: &'a str,
    /// Request timestamp.
    pub timestamp: &'a DateTime<Utc>,
}

/// Sign a request and return the `Authorization` header value.
pub fn sign_request(
    params: &SigningParams<'_>,
    credentials: &AwsCredentials,
) -> Result<String, SigningError> {
    let date_stamp = format_date_stamp(params.timestamp);
    let amz_date = format_datetime(params.timestamp);

    let canonical_request = canonical::build_canonical_request(
        params.method,
        params.uri,
        params.query_string,
        params.headers,
        params.payload_hash,
    );

    let credential_scope = build_credential_scope(&date_stamp, params.region, params.service);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        AWS_ALGORITHM,
        amz_date,
        credential_scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(
        credentials.secret_access_key(),
        &date_stamp,
        params.region,
        params.service,
    )?;
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

    Ok(format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        AWS_ALGORITHM,
        credentials.access_key_id(),
        credential_scope,
        canonical::build_signed_headers(params.headers),
        signature
    ))
}
