//! CSP violation report schema.
//!
//! The typed [`CspReport`] and the [`validate`] function are two views of the
//! same contract: a value of the type only exists if `validate` accepted the
//! payload (or it was reloaded from our own store document).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::logging::structured::LogContext;

/// Top-level key browsers wrap the report body in.
pub const ENVELOPE_KEY: &str = "csp-report";

/// A validated CSP violation report.
///
/// Serialized with the browser's kebab-case field names. Optional fields are
/// omitted when absent rather than written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CspReport {
    pub document_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    pub violated_directive: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_directive: Option<String>,
    pub original_policy: String,
    pub blocked_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_sample: Option<String>,
}

/// The `{"csp-report": {...}}` wrapper as sent by browsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CspReportEnvelope {
    #[serde(rename = "csp-report")]
    pub csp_report: CspReport,
}

impl From<CspReport> for CspReportEnvelope {
    fn from(csp_report: CspReport) -> Self {
        Self { csp_report }
    }
}

/// Why a payload was rejected.
///
/// Carries enough detail for operator logs. Never echoed to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("field `{field}` must be {expected}, got {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("field `{field}` is not a valid URL: {reason}")]
    InvalidUri { field: &'static str, reason: String },
}

/// Validate an untrusted JSON value as a CSP report.
///
/// Unknown keys are ignored and dropped. Absent optional fields are fine;
/// an optional field present with the wrong type (including `null`) is not.
pub fn validate(input: &Value) -> Result<CspReport, ValidationError> {
    let root = input.as_object().ok_or(ValidationError::NotAnObject)?;
    let body = match root.get(ENVELOPE_KEY) {
        None => return Err(ValidationError::MissingField { field: ENVELOPE_KEY }),
        Some(Value::Object(body)) => body,
        Some(other) => {
            return Err(ValidationError::WrongType {
                field: ENVELOPE_KEY,
                expected: "an object",
                found: type_name(other),
            })
        }
    };

    let document_uri = required_string(body, "document-uri")?;
    if let Err(e) = url::Url::parse(&document_uri) {
        return Err(ValidationError::InvalidUri {
            field: "document-uri",
            reason: e.to_string(),
        });
    }

    Ok(CspReport {
        document_uri,
        referrer: optional_string(body, "referrer")?,
        violated_directive: required_string(body, "violated-directive")?,
        effective_directive: optional_string(body, "effective-directive")?,
        original_policy: required_string(body, "original-policy")?,
        blocked_uri: required_string(body, "blocked-uri")?,
        status_code: optional_number(body, "status-code")?,
        script_sample: optional_string(body, "script-sample")?,
    })
}

/// Validate and log the outcome under the given request context.
pub fn validate_logged(input: &Value, ctx: &LogContext) -> Result<CspReport, ValidationError> {
    match validate(input) {
        Ok(report) => {
            crate::log_debug!(
                ctx,
                "REPORT_VALID",
                directive = report.violated_directive,
                blocked_uri = report.blocked_uri
            );
            Ok(report)
        }
        Err(e) => {
            crate::log_warn!(ctx, "REPORT_INVALID", reason = e.to_string());
            Err(e)
        }
    }
}

fn required_string(body: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match body.get(field) {
        None => Err(ValidationError::MissingField { field }),
        Some(value) => expect_string(value, field),
    }
}

fn optional_string(
    body: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    body.get(field)
        .map(|value| expect_string(value, field))
        .transpose()
}

fn optional_number(
    body: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<Number>, ValidationError> {
    match body.get(field) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.clone())),
        Some(other) => Err(ValidationError::WrongType {
            field,
            expected: "a number",
            found: type_name(other),
        }),
    }
}

fn expect_string(value: &Value, field: &'static str) -> Result<String, ValidationError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or(ValidationError::WrongType {
            field,
            expected: "a string",
            found: type_name(value),
        })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
