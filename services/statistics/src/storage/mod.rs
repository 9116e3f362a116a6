//! Durable audit persistence for accepted transactions
//!
//! Optional and boundary-only: the HTTP layer appends a record when a request
//! asks for it. The core engine never reads this data and its correctness
//! does not depend on it.

pub mod audit;
pub mod events;
pub mod segment;

pub use audit::{AuditLog, AuditStats};
pub use events::AuditEvent;
pub use segment::{Segment, SegmentReader};
