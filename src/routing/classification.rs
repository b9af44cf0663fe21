//! Violation classification.
//!
//! Labels each report `pending` (policy still needs work) or `resolved`
//! from its blocked URI alone. Computed on every read, never stored.

use serde::Serialize;

use crate::storage::models::StoredReport;
use crate::validation::schema::CspReport;

/// Classification label for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Pending,
    Resolved,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Pending => "pending",
            Classification::Resolved => "resolved",
        }
    }
}

/// Classify a report by its `blocked-uri`.
///
/// # Decision Tree
/// 1. `"inline"` -> Pending
/// 2. starts with `"http"` (case-sensitive, so `https` too) or empty -> Pending
/// 3. Otherwise (`data:`, `eval`, other schemes) -> Resolved
pub fn classify(report: &CspReport) -> Classification {
    classify_blocked_uri(&report.blocked_uri)
}

/// Same rule as [`classify`], on the raw blocked URI.
pub fn classify_blocked_uri(blocked_uri: &str) -> Classification {
    if blocked_uri == "inline" {
        return Classification::Pending;
    }
    if blocked_uri.starts_with("http") || blocked_uri.is_empty() {
        return Classification::Pending;
    }
    Classification::Resolved
}

/// Stored reports carrying the given classification, in store order.
pub fn filter_by_classification(
    reports: &[StoredReport],
    wanted: Classification,
) -> Vec<StoredReport> {
    reports
        .iter()
        .filter(|item| classify(item.csp_report()) == wanted)
        .cloned()
        .collect()
}
