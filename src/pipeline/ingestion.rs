//! Main report ingestion pipeline.
//!
//! Coordinates the full submission workflow:
//! 1. Decode the body to JSON (when it arrives as raw bytes)
//! 2. Schema validation
//! 3. Append + persist to the store
//! 4. Return the stored report, or a typed rejection

use serde_json::Value;
use thiserror::Error;

use crate::routing::classification::classify;
use crate::storage::models::StoredReport;
use crate::storage::store::{ReportStore, StoreError};
use crate::validation::decode::{decode_payload, DecodeError};
use crate::validation::schema::{validate_logged, ValidationError};

use super::context::RequestContext;

/// Why a submission was not stored.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl IngestError {
    /// True when the submitter sent a bad payload, as opposed to a failure
    /// on our side.
    pub fn is_client_error(&self) -> bool {
        matches!(self, IngestError::Decode(_) | IngestError::Validation(_))
    }
}

/// Ingest a raw request body.
pub async fn ingest_bytes(
    store: &ReportStore,
    ctx: &RequestContext,
    body: &[u8],
) -> Result<StoredReport, IngestError> {
    crate::log_debug!(
        ctx.log,
        "REPORT_RECEIVED",
        bytes = body.len(),
        content_type = ctx.content_type
    );

    let value = match decode_payload(body) {
        Ok(v) => v,
        Err(e) => {
            crate::log_warn!(ctx.log, "REPORT_DECODE_FAILED", error = e.to_string());
            return Err(e.into());
        }
    };

    ingest_value(store, ctx, &value).await
}

/// Ingest an already-decoded JSON payload.
pub async fn ingest_value(
    store: &ReportStore,
    ctx: &RequestContext,
    payload: &Value,
) -> Result<StoredReport, IngestError> {
    let report = validate_logged(payload, &ctx.log)?;
    let log_ctx = ctx.log.with_directive(&report.violated_directive);

    match store.append(report, ctx.report_meta()).await {
        Ok(stored) => {
            crate::log_info!(
                log_ctx,
                "REPORT_STORED",
                blocked_uri = stored.csp_report().blocked_uri,
                classification = classify(stored.csp_report()).as_str(),
                user_agent = stored.user_agent,
                total = store.len()
            );
            Ok(stored)
        }
        Err(e) => {
            crate::log_error!(log_ctx, "REPORT_PERSIST_FAILED", error = e.to_string());
            Err(e.into())
        }
    }
}
