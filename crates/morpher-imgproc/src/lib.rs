#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// cross-dissolve blending module.
pub mod blend;

/// utilities for interpolation.
pub mod interpolation;

/// module containing parallization utilities.
pub mod parallel;
