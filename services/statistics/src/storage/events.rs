//! Audit record types

use serde::{Deserialize, Serialize};
use services_common::{Amount, Ts};

/// One accepted transaction, as persisted to the audit log.
///
/// `accepted_at` is the service-side wall clock at acceptance; `timestamp` is
/// the client-supplied event time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Transaction amount
    pub amount: Amount,
    /// Client-supplied event time
    pub timestamp: Ts,
    /// Service time at which the transaction was accepted
    pub accepted_at: Ts,
}
