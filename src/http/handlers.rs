//! Request handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::logging::structured::LogContext;
use crate::metrics::aggregate::{aggregate, MetricsSummary};
use crate::pipeline::context::RequestContext;
use crate::pipeline::ingestion::{ingest_bytes, IngestError};
use crate::routing::classification::{filter_by_classification, Classification};
use crate::storage::models::StoredReport;
use crate::storage::store::ReportStore;
use crate::validation::decode::is_accepted_content_type;

/// Generic rejection body. Validation detail stays in the logs.
pub const INVALID_REPORT_MESSAGE: &str = "Invalid CSP report";
pub const STORE_FAILURE_MESSAGE: &str = "Failed to store CSP report";

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let (status, message) = if self.is_client_error() {
            (StatusCode::BAD_REQUEST, INVALID_REPORT_MESSAGE)
        } else {
            (StatusCode::INTERNAL_SERVER_ERROR, STORE_FAILURE_MESSAGE)
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// `POST /csp-report`
pub async fn submit_report(
    State(store): State<Arc<ReportStore>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = RequestContext::new(
        header_str(&headers, header::USER_AGENT),
        header_str(&headers, header::CONTENT_TYPE),
    );

    match ctx.content_type.as_deref() {
        Some(ct) if is_accepted_content_type(ct) => {}
        other => {
            crate::log_debug!(ctx.log, "REPORT_UNEXPECTED_CONTENT_TYPE", content_type = other);
        }
    }

    match ingest_bytes(&store, &ctx, &body).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// `GET /csp-reports`
pub async fn list_reports(State(store): State<Arc<ReportStore>>) -> Json<Vec<StoredReport>> {
    Json(store.all().to_vec())
}

/// `GET /csp-reports/pending`
pub async fn list_pending(State(store): State<Arc<ReportStore>>) -> Json<Vec<StoredReport>> {
    Json(filter_by_classification(&store.all(), Classification::Pending))
}

/// `GET /csp-reports/resolved`
pub async fn list_resolved(State(store): State<Arc<ReportStore>>) -> Json<Vec<StoredReport>> {
    Json(filter_by_classification(&store.all(), Classification::Resolved))
}

/// `GET /csp-metrics`
pub async fn metrics(State(store): State<Arc<ReportStore>>) -> Json<MetricsSummary> {
    let ctx = LogContext::generate();
    let metrics = aggregate(&store.all());
    crate::log_debug!(
        ctx,
        "METRICS_COMPUTED",
        total = metrics.summary.total_reports,
        pending = metrics.summary.pending,
        resolved = metrics.summary.resolved,
        directives = metrics.violations_breakdown.len()
    );
    Json(metrics)
}

/// `GET /health`
pub async fn health(State(store): State<Arc<ReportStore>>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "reports": store.len() }))
}
