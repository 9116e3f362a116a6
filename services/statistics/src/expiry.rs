//! Expiry index: ordered buckets of transactions keyed by expiry instant
//!
//! Drives eviction. Every live transaction appears in exactly one bucket,
//! keyed by its own expiry; buckets are only ever removed whole, at or after
//! their deadline.

use crate::Transaction;
use services_common::Ts;
use std::collections::BTreeMap;

/// Ordered mapping from expiry instant to the transactions expiring at that
/// exact millisecond.
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    buckets: BTreeMap<Ts, Vec<Transaction>>,
}

impl ExpiryIndex {
    /// Create an empty index
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }

    /// Register a transaction under its expiry instant
    pub fn insert(&mut self, expiry: Ts, tx: Transaction) {
        self.buckets.entry(expiry).or_default().push(tx);
    }

    /// Earliest pending deadline, if any
    #[must_use]
    pub fn first_deadline(&self) -> Option<Ts> {
        self.buckets.first_key_value().map(|(&deadline, _)| deadline)
    }

    /// Pop the earliest bucket if its deadline is at or before `now`.
    ///
    /// Callers drain a backlog by looping until this returns `None`.
    pub fn pop_due(&mut self, now: Ts) -> Option<(Ts, Vec<Transaction>)> {
        let (&deadline, _) = self.buckets.first_key_value()?;
        if deadline > now {
            return None;
        }
        self.buckets.pop_first()
    }

    /// True when no transactions are pending expiry
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of distinct pending deadlines
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
