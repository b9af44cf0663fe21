//! CSP Reporter - Content-Security-Policy violation report service
//!
//! Ingests browser-generated CSP violation reports, persists them, and
//! exposes metrics that separate still-open ("pending") violations from
//! ones the policy already handles ("resolved").
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `validation` - Payload decoding and report schema validation
//! - `storage` - Append-only report store backed by one JSON document
//! - `routing` - Pending/resolved classification
//! - `metrics` - Summary and per-directive aggregation
//! - `pipeline` - Ingestion orchestrator (decode, validate, append)
//! - `http` - Axum routes and handlers
//! - `config` - Environment-driven settings
//! - `logging` - Structured logging with request context

pub mod config;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod routing;
pub mod storage;
pub mod validation;

pub use http::build_router;
pub use metrics::aggregate::{aggregate, MetricsSummary};
pub use routing::classification::{classify, Classification};
pub use storage::models::{ReportMeta, StoredReport};
pub use storage::store::{ReportCollection, ReportStore, StoreError};
pub use validation::schema::{validate, CspReport, ValidationError};
