//! Core types for the statistics services

use crate::constants::{AMOUNT_SCALE, AMOUNT_SCALE_F64};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monetary amount (stored as i64 milli-units for determinism, 3 decimal places)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(i64); // Internal: milli-units (1 unit = 0.001)

impl Amount {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Create an Amount from an f64, rounding to 3 decimal places.
    /// For external API compatibility only - prefer `from_i64`
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        let scaled = (value * AMOUNT_SCALE_F64).round();
        // Safely convert f64 to i64 using proper bounds
        const MAX_SAFE: f64 = 9_223_372_036_854_775_807.0;
        const MIN_SAFE: f64 = -9_223_372_036_854_775_808.0;

        let clamped = if scaled >= MAX_SAFE {
            i64::MAX
        } else if scaled <= MIN_SAFE {
            i64::MIN
        } else {
            // Now safe to cast after bounds check
            #[allow(clippy::cast_possible_truncation)]
            // SAFETY: Cast is safe within expected range
            let result = scaled as i64;
            result
        };
        Self(clamped)
    }

    /// Get the amount as f64 for external APIs only
    /// WARNING: For values > 2^53 / 1000, this may lose precision
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        // One conversion at the system boundary; internal code stays fixed-point
        #[allow(clippy::cast_precision_loss)]
        // SAFETY: Cast is safe within expected range
        let value = self.0 as f64 / AMOUNT_SCALE_F64;
        value
    }

    /// Create from whole units
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units * AMOUNT_SCALE)
    }

    /// Create from i64 milli-units
    #[must_use]
    pub const fn from_i64(milli: i64) -> Self {
        Self(milli)
    }

    /// Get the amount as i64 milli-units
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Check if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Add two amounts (fixed-point arithmetic)
    #[must_use]
    pub const fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }

    /// Subtract two amounts (fixed-point arithmetic)
    #[must_use]
    pub const fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }

    /// Divide by a count, rounding half away from zero to the nearest
    /// milli-unit. Returns zero for a zero divisor.
    #[must_use]
    pub fn div_round(self, count: u64) -> Self {
        if count == 0 {
            return Self::ZERO;
        }
        let n = i128::from(self.0);
        let d = i128::from(count);
        let q = if n >= 0 { (n + d / 2) / d } else { (n - d / 2) / d };
        // SAFETY: i128 to i64 - |q| <= |n| and n came from an i64
        #[allow(clippy::cast_possible_truncation)]
        let milli = q as i64;
        Self(milli)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / AMOUNT_SCALE;
        let frac = (self.0 % AMOUNT_SCALE).abs();
        write!(f, "{whole}.{frac:03}")
    }
}

/// Timestamp in milliseconds since UNIX epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ts(u64);

impl Ts {
    /// Get the current wall-clock timestamp
    #[must_use]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| std::time::Duration::from_secs(0));
        // SAFETY: u128 to u64 - epoch millis fit in u64 for ~584M years
        #[allow(clippy::cast_possible_truncation)]
        let millis = duration.as_millis() as u64;
        Self(millis)
    }

    /// Create a timestamp from epoch milliseconds
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Get the timestamp as epoch milliseconds
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Timestamp shifted forward by `millis`, saturating at the type bounds
    #[must_use]
    pub const fn saturating_add(self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Timestamp shifted backward by `millis`, saturating at zero
    #[must_use]
    pub const fn saturating_sub(self, millis: u64) -> Self {
        Self(self.0.saturating_sub(millis))
    }

    /// Milliseconds from `self` until `later`; zero when `later` is not later
    #[must_use]
    pub const fn millis_until(self, later: Self) -> u64 {
        later.0.saturating_sub(self.0)
    }
}

impl fmt::Display for Ts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
