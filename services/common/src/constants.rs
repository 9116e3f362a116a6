//! Common constants used across the statistics services
//!
//! Single source of truth for all magic numbers

// Fixed-point arithmetic constants
/// Decimal places retained on every monetary value
pub const AMOUNT_PRECISION: u32 = 3;
/// Fixed-point scale factor (10^`AMOUNT_PRECISION`)
pub const AMOUNT_SCALE: i64 = 1000;
pub const AMOUNT_SCALE_F64: f64 = 1000.0;

// Time constants
pub const MILLIS_PER_SEC: u64 = 1000;
pub const SECS_PER_MIN: u64 = 60;

/// Trailing interval over which statistics are computed, and equivalently the
/// maximum transaction age the service accepts
pub const DEFAULT_WINDOW_MS: u64 = SECS_PER_MIN * MILLIS_PER_SEC;
