//! Extremum candidate index
//!
//! Answers "what is the new minimum/maximum" in sub-linear time after the
//! current extremum expires, without rescanning all live transactions. This
//! is the sliding-window min/max problem solved over an ordered map instead
//! of the classic monotonic deque: arrivals may carry client-supplied
//! historical timestamps, so candidacy is decided by value/lifetime dominance
//! rather than arrival order.
//!
//! Every transaction carries the same fixed window, so expiry order equals
//! timestamp order; dominance is therefore compared on timestamps directly.

use services_common::{Amount, Ts};
use std::collections::BTreeMap;

/// Ordered mapping from amount to the timestamps of live transactions that
/// are retained as minimum or maximum candidates.
///
/// Invariant: whenever any transaction is live, the lowest key is the live
/// minimum and the highest key is the live maximum. The index holds a subset
/// of live transactions; a transaction that is not admitted is provably never
/// going to become the live extremum before a retained candidate covers that
/// role. Timestamp buckets are multisets: duplicate amounts at distinct
/// timestamps are distinct candidates.
#[derive(Debug, Default)]
pub struct ExtremaIndex {
    candidates: BTreeMap<Amount, Vec<Ts>>,
}

impl ExtremaIndex {
    /// Create an empty index
    #[must_use]
    pub const fn new() -> Self {
        Self {
            candidates: BTreeMap::new(),
        }
    }

    /// Consider `(amount, timestamp)` for candidacy; min- and max-candidacy
    /// are evaluated independently and the transaction is retained if either
    /// admits it. Returns whether the transaction was admitted.
    pub fn insert(&mut self, amount: Amount, timestamp: Ts) -> bool {
        let admitted = self.admits_min(amount, timestamp) || self.admits_max(amount, timestamp);
        if admitted {
            self.candidates.entry(amount).or_default().push(timestamp);
        }
        admitted
    }

    /// A transaction is dominated for min-candidacy when some key at or below
    /// its amount already holds a candidate that will outlive it.
    fn admits_min(&self, amount: Amount, timestamp: Ts) -> bool {
        match self.candidates.first_key_value() {
            None => true,
            Some((&lowest, _)) if amount < lowest => true,
            _ => !self
                .candidates
                .range(..=amount)
                .any(|(_, bucket)| bucket.iter().any(|&ts| ts >= timestamp)),
        }
    }

    /// Mirror of [`ExtremaIndex::admits_min`] over the keys at or above the
    /// amount.
    fn admits_max(&self, amount: Amount, timestamp: Ts) -> bool {
        match self.candidates.last_key_value() {
            None => true,
            Some((&highest, _)) if amount > highest => true,
            _ => !self
                .candidates
                .range(amount..)
                .rev()
                .any(|(_, bucket)| bucket.iter().any(|&ts| ts >= timestamp)),
        }
    }

    /// Remove one occurrence of `timestamp` from the `amount` bucket.
    ///
    /// No-op when the pair is absent: dominated transactions were never
    /// admitted, and eviction calls this for every expiring transaction.
    pub fn remove(&mut self, amount: Amount, timestamp: Ts) {
        if let Some(bucket) = self.candidates.get_mut(&amount) {
            if let Some(pos) = bucket.iter().position(|&ts| ts == timestamp) {
                bucket.swap_remove(pos);
            }
            if bucket.is_empty() {
                self.candidates.remove(&amount);
            }
        }
    }

    /// Current live minimum (lowest retained key)
    #[must_use]
    pub fn min(&self) -> Option<Amount> {
        self.candidates.first_key_value().map(|(&amount, _)| amount)
    }

    /// Current live maximum (highest retained key)
    #[must_use]
    pub fn max(&self) -> Option<Amount> {
        self.candidates.last_key_value().map(|(&amount, _)| amount)
    }

    /// True when no candidates are retained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of retained candidate entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.values().map(Vec::len).sum()
    }
}
