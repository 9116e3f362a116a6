//! HTTP handlers for the statistics API
//!
//! Maps the engine's typed accept/snapshot contract onto transport status
//! codes: `201 Created` on acceptance, `400 Bad Request` for an invalid
//! amount, `204 No Content` for a transaction older than the window.

use crate::AggregateView;
use crate::server::AppState;
use crate::storage::AuditEvent;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use services_common::{Amount, RejectReason, Ts};
use tracing::{debug, warn};

/// Body of `POST /transactions`
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRequest {
    /// Transaction amount; absence is rejected as an invalid amount
    pub amount: Option<f64>,
    /// Event time in epoch milliseconds
    pub timestamp: u64,
    /// When true, the accepted transaction is also persisted to the audit log
    #[serde(default)]
    pub test: bool,
}

/// Query parameters of `GET /statistics`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatisticsQuery {
    /// When true, the response carries the time the snapshot was computed
    #[serde(default)]
    pub test: bool,
}

/// Response body of `GET /statistics`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatisticsResponse {
    /// The aggregate snapshot
    #[serde(flatten)]
    pub stats: AggregateView,
    /// Snapshot time in epoch milliseconds, present only for test queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed_time: Option<u64>,
}

/// Response body of `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,
    /// Crate version
    pub version: String,
    /// Seconds since the service started
    pub uptime_seconds: u64,
}

/// `POST /transactions`
pub async fn post_transaction(
    State(state): State<AppState>,
    Json(request): Json<TransactionRequest>,
) -> StatusCode {
    let Some(amount) = request.amount else {
        debug!("rejected transaction without amount");
        return StatusCode::BAD_REQUEST;
    };

    let timestamp = Ts::from_millis(request.timestamp);
    match state.engine.accept(amount, timestamp) {
        Ok(()) => {
            if request.test {
                audit_accepted(&state, amount, timestamp).await;
            }
            StatusCode::CREATED
        }
        Err(RejectReason::InvalidAmount) => StatusCode::BAD_REQUEST,
        Err(RejectReason::TooOld) => StatusCode::NO_CONTENT,
    }
}

/// Persist an accepted transaction to the audit log; failures are logged and
/// never surfaced to the caller.
async fn audit_accepted(state: &AppState, amount: f64, timestamp: Ts) {
    let Some(audit) = &state.audit else {
        return;
    };
    let event = AuditEvent {
        amount: Amount::from_f64(amount),
        timestamp,
        accepted_at: state.engine.now(),
    };
    let mut log = audit.lock().await;
    if let Err(e) = log.append(&event) {
        warn!("failed to append audit record: {}", e);
    }
}

/// `GET /statistics`
pub async fn get_statistics(
    State(state): State<AppState>,
    Query(query): Query<StatisticsQuery>,
) -> Json<StatisticsResponse> {
    let stats = state.engine.snapshot();
    let computed_time = query.test.then(|| state.engine.now().as_millis());
    Json(StatisticsResponse {
        stats,
        computed_time,
    })
}

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
