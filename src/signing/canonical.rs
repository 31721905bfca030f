//! Canonical request building for AWS Signature V4.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;

/// Unreserved characters, left as-is by SigV4 URI encoding.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn uri_encode(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Canonical URI: each path segment encoded, `/` when empty.
pub fn build_canonical_uri(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    let segments: Vec<String> = trimmed.split('/').map(uri_encode).collect();
    format!("/{}", segments.join("/"))
}

/// Canonical query string: parameters encoded and sorted by name then value.
pub fn build_canonical_query_string(query_string: &str) -> String {
    let mut params: Vec<(String, String)> = query_string
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (uri_encode(key), uri_encode(value))
        })
        .collect();
    params.sort();

    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn signed_header_map(headers: &[(String, String)]) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.to_lowercase();
        if super::should_sign_header(&name) {
            let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
            map.entry(name).or_default().push(value);
        }
    }
    map
}

/// Canonical headers: lowercased, whitespace-collapsed, sorted, one per line.
pub fn build_canonical_headers(headers: &[(String, String)]) -> String {
    signed_header_map(headers)
        .iter()
        .map(|(name, values)| format!("{}:{}\n", name, values.join(",")))
        .collect()
}

/// Semicolon-separated list of signed header names.
pub fn build_signed_headers(headers: &[(String, String)]) -> String {
    signed_header_map(headers)
        .into_keys()
        .collect::<Vec<_>>()
        .join(";")
}

/// Build the canonical request string.
///
/// ```text
/// HTTPMethod\n
/// CanonicalURI\n
/// CanonicalQueryString\n
/// CanonicalHeaders\n
/// SignedHeaders\n
/// HashedPayload
/// ```
pub fn build_canonical_request(
    method: &str,
    uri: &str,
    query_string: &str,
    headers: &[(String, String)],
    payload_hash: &str,
) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.to_uppercase(),
        build_canonical_uri(uri),
        build_canonical_query_string(query_string),
        build_canonical_headers(headers),
        build_signed_headers(headers),
        payload_hash
    )
}
