//! Common types shared across the statistics services
//!
//! Single source of truth for the fixed-point money type, the
//! epoch-millisecond timestamp type, validation errors and the numeric
//! constants the service contract is defined in terms of.

pub mod constants;
pub mod errors;
pub mod types;

pub use constants::*;
pub use errors::*;
pub use types::*;
