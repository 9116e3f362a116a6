//! Common error types for the statistics services

use thiserror::Error;

/// Reasons the statistics engine refuses a transaction.
///
/// Returned to the caller before any state is mutated; the transport layer
/// maps each variant to a user-visible status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Amount missing, non-finite or negative
    #[error("transaction amount is missing or invalid")]
    InvalidAmount,

    /// Timestamp older than the statistics window
    #[error("transaction is older than the statistics window")]
    TooOld,
}
