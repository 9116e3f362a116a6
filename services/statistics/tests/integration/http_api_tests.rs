//! Integration tests for the HTTP boundary
//!
//! Drives the axum router directly and checks the status mapping of the
//! accept contract plus the statistics JSON shape.

use anyhow::Result;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use payment_statistics::server::{AppState, router};
use payment_statistics::{AuditLog, StatsEngine};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tower::ServiceExt;

fn test_state(audit: Option<Arc<Mutex<AuditLog>>>) -> AppState {
    AppState {
        engine: Arc::new(StatsEngine::new(60_000)),
        audit,
        started_at: Instant::now(),
    }
}

fn post_transaction(body: String) -> Request<Body> {
    Request::post("/transactions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request")
}

#[tokio::test]
async fn test_accepted_transaction_returns_201() -> Result<()> {
    let state = test_state(None);
    let app = router(state.clone());
    let now = state.engine.now().as_millis();

    let response = app
        .oneshot(post_transaction(format!(
            r#"{{"amount": 12.3343, "timestamp": {now}}}"#
        )))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let stats = state.engine.snapshot();
    assert_eq!(stats.count, 1);
    assert_eq!(stats.sum, 12.334);

    Ok(())
}

#[tokio::test]
async fn test_invalid_amount_returns_400() -> Result<()> {
    let state = test_state(None);
    let now = state.engine.now().as_millis();

    // Negative amount
    let response = router(state.clone())
        .oneshot(post_transaction(format!(
            r#"{{"amount": -1.0, "timestamp": {now}}}"#
        )))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing amount
    let response = router(state.clone())
        .oneshot(post_transaction(format!(r#"{{"timestamp": {now}}}"#)))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(state.engine.snapshot().count, 0);
    Ok(())
}

#[tokio::test]
async fn test_old_transaction_returns_204() -> Result<()> {
    let state = test_state(None);
    let old = state.engine.now().as_millis() - 120_000;

    let response = router(state.clone())
        .oneshot(post_transaction(format!(
            r#"{{"amount": 5.0, "timestamp": {old}}}"#
        )))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(state.engine.snapshot().count, 0);

    Ok(())
}

#[tokio::test]
async fn test_statistics_json_shape() -> Result<()> {
    let state = test_state(None);
    let now = state.engine.now();
    state.engine.accept(10.0, now)?;
    state.engine.accept(30.0, now)?;

    let response = router(state.clone())
        .oneshot(Request::get("/statistics").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let json: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(json["sum"], 40.0);
    assert_eq!(json["avg"], 20.0);
    assert_eq!(json["min"], 10.0);
    assert_eq!(json["max"], 30.0);
    assert_eq!(json["count"], 2);
    assert!(json.get("computed_time").is_none());

    // Test queries additionally carry the snapshot time
    let response = router(state)
        .oneshot(Request::get("/statistics?test=true").body(Body::empty())?)
        .await?;
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let json: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert!(json["computed_time"].is_u64());

    Ok(())
}

#[tokio::test]
async fn test_statistics_omits_extrema_when_empty() -> Result<()> {
    let response = router(test_state(None))
        .oneshot(Request::get("/statistics").body(Body::empty())?)
        .await?;

    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let json: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(json["count"], 0);
    assert_eq!(json["sum"], 0.0);
    assert!(json.get("min").is_none());
    assert!(json.get("max").is_none());

    Ok(())
}

#[tokio::test]
async fn test_flagged_transaction_is_audited() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let audit = Arc::new(Mutex::new(AuditLog::new(temp_dir.path(), None)?));
    let state = test_state(Some(Arc::clone(&audit)));
    let now = state.engine.now().as_millis();

    // One flagged, one unflagged: only the flagged one is persisted
    let response = router(state.clone())
        .oneshot(post_transaction(format!(
            r#"{{"amount": 7.5, "timestamp": {now}, "test": true}}"#
        )))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router(state.clone())
        .oneshot(post_transaction(format!(
            r#"{{"amount": 2.5, "timestamp": {now}}}"#
        )))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let mut log = audit.lock().await;
    log.flush()?;
    assert_eq!(log.stats()?.total_entries, 1);

    let entry = log.stream(None)?.read_next_entry()?.expect("audit entry");
    assert_eq!(entry.amount.as_f64(), 7.5);
    assert!(entry.accepted_at >= entry.timestamp);

    Ok(())
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let response = router(test_state(None))
        .oneshot(Request::get("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let json: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(json["status"], "healthy");

    Ok(())
}
