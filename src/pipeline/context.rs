//! Request context management.
//!
//! Carries the per-request metadata that ingestion logs and stores.

use chrono::{DateTime, Utc};

use crate::logging::structured::LogContext;
use crate::storage::models::{now_millis, ReportMeta};

/// Context for one inbound report submission.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub log: LogContext,
    pub received_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub content_type: Option<String>,
}

impl RequestContext {
    pub fn new(user_agent: Option<&str>, content_type: Option<&str>) -> Self {
        Self {
            log: LogContext::generate(),
            received_at: now_millis(),
            user_agent: user_agent.map(|s| s.to_string()),
            content_type: content_type.map(|s| s.to_string()),
        }
    }

    /// Ingestion metadata for the store. The user agent is copied verbatim.
    pub fn report_meta(&self) -> ReportMeta {
        ReportMeta {
            timestamp: self.received_at,
            user_agent: self.user_agent.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_meta_copies_user_agent() {
        let ctx = RequestContext::new(Some("Mozilla/5.0 (X11)"), Some("application/csp-report"));
        let meta = ctx.report_meta();
        assert_eq!(meta.user_agent.as_deref(), Some("Mozilla/5.0 (X11)"));
        assert_eq!(meta.timestamp, ctx.received_at);
        assert_eq!(meta.timestamp.timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
