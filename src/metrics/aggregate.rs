//! Single-pass metrics aggregation.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::routing::classification::{classify, Classification};
use crate::storage::models::StoredReport;

/// Pending/resolved counts for one directive in the summary view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectiveCounts {
    pub pending: usize,
    pub resolved: usize,
}

/// Overall counts plus cross-directive unique values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_reports: usize,
    pub pending: usize,
    pub resolved: usize,
    pub by_directive: BTreeMap<String, DirectiveCounts>,
    pub unique_blocked_uris: BTreeSet<String>,
    pub unique_script_samples: BTreeSet<String>,
}

/// Detailed view of one violated directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveBreakdown {
    pub pending_count: usize,
    pub resolved_count: usize,
    pub total_violations: usize,
    pub unique_blocked_uris: BTreeSet<String>,
    pub unique_script_samples: BTreeSet<String>,
}

/// Body of the metrics endpoint.
///
/// Unique-value sets serialize as JSON arrays. Their order carries no
/// meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub summary: Summary,
    pub violations_breakdown: BTreeMap<String, DirectiveBreakdown>,
}

/// Aggregate the collection in one pass.
///
/// Every report contributes exactly one classification to the totals and
/// to its directive. Every blocked URI (including `""`) lands in the URI
/// sets; empty or absent script samples are skipped.
pub fn aggregate(reports: &[StoredReport]) -> MetricsSummary {
    let mut metrics = MetricsSummary::default();
    metrics.summary.total_reports = reports.len();

    for item in reports {
        let report = item.csp_report();
        let directive = &report.violated_directive;
        let status = classify(report);

        let counts = metrics
            .summary
            .by_directive
            .entry(directive.clone())
            .or_default();
        let breakdown = metrics
            .violations_breakdown
            .entry(directive.clone())
            .or_default();

        match status {
            Classification::Pending => {
                metrics.summary.pending += 1;
                counts.pending += 1;
                breakdown.pending_count += 1;
            }
            Classification::Resolved => {
                metrics.summary.resolved += 1;
                counts.resolved += 1;
                breakdown.resolved_count += 1;
            }
        }
        breakdown.total_violations += 1;

        breakdown.unique_blocked_uris.insert(report.blocked_uri.clone());
        metrics
            .summary
            .unique_blocked_uris
            .insert(report.blocked_uri.clone());

        if let Some(sample) = report.script_sample.as_deref().filter(|s| !s.is_empty()) {
            breakdown.unique_script_samples.insert(sample.to_string());
            metrics
                .summary
                .unique_script_samples
                .insert(sample.to_string());
        }
    }

    metrics
}
