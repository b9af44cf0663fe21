//! `csp-reporter` binary: load the store, then serve the report API.

use std::sync::Arc;

use anyhow::Context;
use csp_reporter::config::ServerConfig;
use csp_reporter::http::build_router;
use csp_reporter::logging::init_logger;
use csp_reporter::storage::ReportStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;
    init_logger(config.log_level);

    // A store we cannot read must stop startup; serving would hide prior data.
    let store = ReportStore::load(&config.store_path)
        .await
        .with_context(|| format!("failed to load report store {}", config.store_path.display()))?;

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    log::info!(
        "SERVER_LISTENING addr={} store={} reports={}",
        addr,
        config.store_path.display(),
        store.len()
    );

    let app = build_router(Arc::new(store), config.max_body_bytes);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    log::info!("SERVER_STOPPED");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("SIGNAL_HANDLER_FAILED signal=ctrl_c error={}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("SIGNAL_HANDLER_FAILED signal=sigterm error={}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("SHUTDOWN_REQUESTED");
}
