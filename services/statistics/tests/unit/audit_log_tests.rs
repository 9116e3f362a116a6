//! Unit tests for the audit log

use anyhow::Result;
use payment_statistics::{AuditEvent, AuditLog};
use rstest::*;
use services_common::{Amount, Ts};
use tempfile::TempDir;

/// Test fixture for a fresh audit directory
#[fixture]
fn audit_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

fn event(units: i64, ts: u64) -> AuditEvent {
    AuditEvent {
        amount: Amount::from_units(units),
        timestamp: Ts::from_millis(ts),
        accepted_at: Ts::from_millis(ts + 3),
    }
}

#[rstest]
fn test_roundtrip_across_reopen(audit_dir: TempDir) -> Result<()> {
    {
        let mut log = AuditLog::new(audit_dir.path(), None)?;
        log.append(&event(10, 100))?;
        log.append(&event(20, 200))?;
        log.flush()?;
    }

    // Reopening continues the existing segment sequence and replays all
    let mut log = AuditLog::new(audit_dir.path(), None)?;
    log.append(&event(30, 300))?;
    log.flush()?;

    let mut iter = log.stream(None)?;
    let mut amounts = Vec::new();
    while let Some(entry) = iter.read_next_entry()? {
        amounts.push(entry.amount);
    }
    assert_eq!(
        amounts,
        vec![
            Amount::from_units(10),
            Amount::from_units(20),
            Amount::from_units(30)
        ]
    );

    Ok(())
}

#[rstest]
fn test_unflushed_appends_are_buffered(audit_dir: TempDir) -> Result<()> {
    let mut log = AuditLog::new(audit_dir.path(), None)?;
    log.append(&event(1, 1))?;
    log.flush()?;
    log.append(&event(2, 2))?;

    // Only the flushed entry is visible on disk
    let stats = log.stats()?;
    assert_eq!(stats.total_entries, 1);

    log.flush()?;
    assert_eq!(log.stats()?.total_entries, 2);

    Ok(())
}

#[rstest]
fn test_stream_filters_by_event_time(audit_dir: TempDir) -> Result<()> {
    let mut log = AuditLog::new(audit_dir.path(), None)?;
    for i in 1..=6 {
        log.append(&event(i, i as u64 * 10))?;
    }
    log.flush()?;

    let mut iter = log.stream(Some(Ts::from_millis(40)))?;
    let mut seen = 0;
    while let Some(entry) = iter.read_next_entry()? {
        assert!(entry.timestamp >= Ts::from_millis(40));
        seen += 1;
    }
    assert_eq!(seen, 3);

    Ok(())
}
