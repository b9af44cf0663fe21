//! Stored report models.
//!
//! These models are the persisted document format as well as the body of
//! the report listing endpoints.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::schema::{CspReport, CspReportEnvelope};

/// Ingestion metadata captured when a report is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMeta {
    pub timestamp: DateTime<Utc>,
    pub user_agent: Option<String>,
}

impl ReportMeta {
    /// Metadata stamped with the current time.
    pub fn now(user_agent: Option<String>) -> Self {
        Self {
            timestamp: now_millis(),
            user_agent,
        }
    }
}

/// Current time at millisecond precision, the resolution stored documents use.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// An accepted report plus its ingestion metadata. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReport {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub report: CspReportEnvelope,
}

impl StoredReport {
    pub fn new(report: CspReport, meta: ReportMeta) -> Self {
        Self {
            timestamp: meta.timestamp,
            user_agent: meta.user_agent,
            report: report.into(),
        }
    }

    pub fn csp_report(&self) -> &CspReport {
        &self.report.csp_report
    }
}
