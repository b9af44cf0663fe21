//! Axum router configuration.
//!
//! ```text
//! POST /csp-report              - submit a violation report (204 / 400)
//! GET  /csp-reports             - all stored reports
//! GET  /csp-reports/pending     - stored reports classified pending
//! GET  /csp-reports/resolved    - stored reports classified resolved
//! GET  /csp-metrics             - summary + per-directive breakdown
//! GET  /health                  - liveness and report count
//! ```

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::storage::store::ReportStore;

use super::handlers::{
    health, list_pending, list_reports, list_resolved, metrics, submit_report,
};

/// Build the complete router over a loaded store.
///
/// Bodies larger than `max_body_bytes` are rejected with 413 before they
/// reach validation.
pub fn build_router(store: Arc<ReportStore>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/csp-report", post(submit_report))
        .route("/csp-reports", get(list_reports))
        .route("/csp-reports/pending", get(list_pending))
        .route("/csp-reports/resolved", get(list_resolved))
        .route("/csp-metrics", get(metrics))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(store)
}
