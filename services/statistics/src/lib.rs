//! Payment Statistics Service
//!
//! Maintains running statistics (sum, average, minimum, maximum, count) over
//! all transactions whose event time falls within a trailing 60 second window
//! of "now":
//! - O(1) statistics queries regardless of transaction volume
//! - High-rate concurrent writes, linearized by a single reader-writer lock
//! - Self-expiring aggregates driven by a deadline-armed eviction worker
//! - Sub-linear min/max recomputation on expiry via a candidate index

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod expiry;
pub mod extrema;
pub mod handlers;
pub mod server;
pub mod storage;

use serde::Serialize;
use services_common::{Amount, Ts};

// Re-export the service surface
pub use aggregate::Aggregate;
pub use config::StatisticsConfig;
pub use engine::StatsEngine;
pub use storage::{AuditEvent, AuditLog};

/// A single accepted transaction.
///
/// Immutable once accepted; the expiry and extremum-candidate indices hold
/// its identifying fields independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    /// Transaction amount
    pub amount: Amount,
    /// Event time of the transaction
    pub timestamp: Ts,
}

impl Transaction {
    /// Create a new transaction
    #[must_use]
    pub const fn new(amount: Amount, timestamp: Ts) -> Self {
        Self { amount, timestamp }
    }

    /// Instant at which this transaction leaves the statistics window
    #[must_use]
    pub const fn expiry(&self, window_ms: u64) -> Ts {
        self.timestamp.saturating_add(window_ms)
    }
}

/// Point-in-time copy of the aggregate, as exposed to callers.
///
/// `min` and `max` are absent whenever no transaction is live.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateView {
    /// Sum of live transaction amounts
    pub sum: f64,
    /// Average of live transaction amounts (0 when none are live)
    pub avg: f64,
    /// Smallest live transaction amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Largest live transaction amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Number of live transactions
    pub count: u64,
}
