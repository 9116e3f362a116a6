//! Running aggregate over the live transaction set
//!
//! Holds sum, count, min and max and derives the average. All arithmetic is
//! fixed-point; f64 appears only in the outward-facing view.

use crate::AggregateView;
use services_common::Amount;

/// Running statistics over the currently live transactions.
///
/// Owned exclusively by the statistics engine and mutated only under its
/// write lock. `remove` deliberately leaves `min`/`max` untouched while
/// transactions remain live: recomputing an extremum after the current one
/// expires requires the candidate index, so the engine installs the new
/// extrema with [`Aggregate::set_extrema`] after each eviction batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregate {
    sum: Amount,
    avg: Amount,
    min: Option<Amount>,
    max: Option<Amount>,
    count: u64,
}

impl Default for Aggregate {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregate {
    /// Create an empty aggregate
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sum: Amount::ZERO,
            avg: Amount::ZERO,
            min: None,
            max: None,
            count: 0,
        }
    }

    /// Fold one amount into the aggregate
    pub fn add(&mut self, amount: Amount) {
        self.sum = self.sum.add(amount);
        self.count += 1;
        self.avg = self.sum.div_round(self.count);
        self.min = Some(self.min.map_or(amount, |m| m.min(amount)));
        self.max = Some(self.max.map_or(amount, |m| m.max(amount)));
    }

    /// Remove one previously added amount.
    ///
    /// Resets to the empty state when the last transaction leaves.
    pub fn remove(&mut self, amount: Amount) {
        debug_assert!(self.count > 0, "remove from empty aggregate");
        self.count = self.count.saturating_sub(1);
        if self.count == 0 {
            self.reset();
        } else {
            self.sum = self.sum.sub(amount);
            self.avg = self.sum.div_round(self.count);
        }
    }

    /// Install recomputed extrema after an eviction batch
    pub(crate) fn set_extrema(&mut self, min: Option<Amount>, max: Option<Amount>) {
        self.min = min;
        self.max = max;
    }

    /// Reset to the empty state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Number of live transactions
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Sum of live transaction amounts
    #[must_use]
    pub const fn sum(&self) -> Amount {
        self.sum
    }

    /// Smallest live transaction amount
    #[must_use]
    pub const fn min(&self) -> Option<Amount> {
        self.min
    }

    /// Largest live transaction amount
    #[must_use]
    pub const fn max(&self) -> Option<Amount> {
        self.max
    }

    /// Immutable copy of the aggregate for callers; never mutates state
    #[must_use]
    pub fn read(&self) -> AggregateView {
        AggregateView {
            sum: self.sum.as_f64(),
            avg: self.avg.as_f64(),
            min: self.min.map(|m| m.as_f64()),
            max: self.max.map(|m| m.as_f64()),
            count: self.count,
        }
    }
}
