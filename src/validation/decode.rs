//! Payload decoding.
//!
//! Browsers send violation reports as `application/csp-report`, which the
//! HTTP layer does not parse for us. Every accepted media type is decoded
//! here into a JSON value before schema validation.

use serde_json::Value;
use thiserror::Error;

/// Media types accepted on the report endpoint.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "application/csp-report",
    "application/json",
    "application/reports+json",
];

/// The request body is not parseable JSON.
#[derive(Debug, Error)]
#[error("report body is not valid JSON: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Decode a raw request body into a JSON value.
pub fn decode_payload(body: &[u8]) -> Result<Value, DecodeError> {
    Ok(serde_json::from_slice(body)?)
}

/// Returns true when `content_type` names one of the accepted media types.
///
/// Parameters such as `; charset=utf-8` are ignored.
pub fn is_accepted_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ACCEPTED_CONTENT_TYPES.contains(&essence.as_str())
}
