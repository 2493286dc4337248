//! Pixel interpolation methods for image resampling.
//!
//! This module provides the sampling kernels used when pulling pixel values
//! from fractional source coordinates during warping and remapping.
//!
//! # Interpolation Modes
//!
//! - **Nearest**: Fastest, uses nearest pixel value (no interpolation)
//! - **Bilinear**: Smooth linear interpolation between adjacent pixels
//!
//! Both modes clamp coordinates to the image border before sampling, so a
//! coordinate outside the image repeats the nearest edge pixel instead of
//! wrapping around or filling with a constant.

mod bilinear;

/// Grid generation and coordinate mapping utilities.
///
/// Functions for generating coordinate grids used in image warping
/// and remapping operations.
pub mod grid;

pub(crate) mod interpolate;
mod nearest;
mod remap;

pub use interpolate::{interpolate_pixel, sample, InterpolationMode};
pub use remap::{remap, remap_with};
