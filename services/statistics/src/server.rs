//! HTTP server wiring for the statistics service

use crate::config::StatisticsConfig;
use crate::engine::StatsEngine;
use crate::handlers;
use crate::storage::AuditLog;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Per-request timeout
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The windowed statistics engine
    pub engine: Arc<StatsEngine>,
    /// Audit log, when enabled
    pub audit: Option<Arc<Mutex<AuditLog>>>,
    /// Service start time, for the health endpoint
    pub started_at: Instant,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .field("audit", &self.audit.as_ref().map(|_| "AuditLog"))
            .finish_non_exhaustive()
    }
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/transactions", post(handlers::post_transaction))
        .route("/statistics", get(handlers::get_statistics))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .with_state(state)
}

/// Construct the engine and audit log from configuration and serve until the
/// listener fails
pub async fn serve(config: StatisticsConfig) -> Result<()> {
    let engine = Arc::new(StatsEngine::new(config.window_ms));

    let audit = if config.audit.enabled {
        let log = AuditLog::new(Path::new(&config.audit.dir), Some(config.audit.segment_size))?;
        let audit = Arc::new(Mutex::new(log));
        spawn_audit_flush(
            Arc::clone(&audit),
            Duration::from_secs(config.audit.flush_interval_secs),
        );
        Some(audit)
    } else {
        None
    };

    let state = AppState {
        engine,
        audit,
        started_at: Instant::now(),
    };
    let app = router(state);

    let addr: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        %addr,
        window_ms = config.window_ms,
        "payment statistics service listening"
    );

    axum::serve(listener, app)
        .await
        .context("HTTP server error")?;
    Ok(())
}

/// Periodically flush the audit log to disk
fn spawn_audit_flush(audit: Arc<Mutex<AuditLog>>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(e) = audit.lock().await.flush() {
                error!("failed to flush audit log: {}", e);
            }
        }
    });
}
