//! Structured logging utilities.
//!
//! Every line is `<context> EVENT_NAME key=value ...` so operators can grep
//! a single report through ingestion, persistence and metrics.

use std::fmt;

use uuid::Uuid;

/// Initialize the process-wide logger.
///
/// Safe to call more than once; later calls are no-ops. `RUST_LOG` still
/// takes precedence over `default_level` when set.
pub fn init_logger(default_level: log::LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level).format_timestamp_millis();
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let _ = builder.try_init();
}

/// Logging context for one inbound request.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub request_id: String,
    pub directive: Option<String>,
}

impl LogContext {
    pub fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            directive: None,
        }
    }

    /// Context with a freshly generated `req-xxxxxxxx` id.
    pub fn generate() -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self::new(&format!("req-{}", &id[..8]))
    }

    pub fn with_directive(&self, directive: &str) -> Self {
        Self {
            request_id: self.request_id.clone(),
            directive: Some(directive.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.directive {
            Some(d) => write!(f, "[req={}] [directive={}]", self.request_id, d),
            None => write!(f, "[req={}]", self.request_id),
        }
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::info!(
            concat!("{} {}" $(, " ", stringify!($key), "={:?}")*),
            $ctx,
            $event
            $(, $value)*
        )
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::warn!(
            concat!("{} {}" $(, " ", stringify!($key), "={:?}")*),
            $ctx,
            $event
            $(, $value)*
        )
    };
}

/// Log an error message with context.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::error!(
            concat!("{} {}" $(, " ", stringify!($key), "={:?}")*),
            $ctx,
            $event
            $(, $value)*
        )
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::debug!(
            concat!("{} {}" $(, " ", stringify!($key), "={:?}")*),
            $ctx,
            $event
            $(, $value)*
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context_display() {
        let ctx = LogContext::new("req-123");
        assert_eq!(format!("{}", ctx), "[req=req-123]");

        let with_directive = ctx.with_directive("script-src");
        assert_eq!(
            format!("{}", with_directive),
            "[req=req-123] [directive=script-src]"
        );
    }

    #[test]
    fn test_generated_request_id_shape() {
        let ctx = LogContext::generate();
        assert!(ctx.request_id.starts_with("req-"));
        assert_eq!(ctx.request_id.len(), 12);
        assert!(ctx.directive.is_none());
    }

    #[test]
    fn test_macros_accept_zero_and_many_fields() {
        let ctx = LogContext::new("req-macro");
        crate::log_info!(ctx, "NO_FIELDS");
        crate::log_warn!(ctx, "TWO_FIELDS", a = 1, b = "two");
        crate::log_debug!(ctx, "TRAILING_COMMA", a = 1,);
        crate::log_error!(ctx, "ONE_FIELD", reason = "x");
    }
}
