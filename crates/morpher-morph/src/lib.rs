#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// cooperative cancellation of frame generation.
pub mod cancel;

/// engine parameters.
pub mod config;

/// matched feature pairs between the two source images.
pub mod correspondence;

/// error types for the morph module.
pub mod error;

/// feature primitives.
pub mod feature;

/// per-pixel inverse mapping from correspondences.
pub mod field;

/// ordered, lazy frame generation.
pub mod sequence;

/// the inputs of one morph.
pub mod session;

pub use crate::cancel::CancelToken;
pub use crate::config::{EdgePolicy, MorphConfig};
pub use crate::correspondence::{Correspondence, CorrespondenceSet, FeaturePair, Side};
pub use crate::error::{MorphError, ValidationError};
pub use crate::feature::{Feature, FeatureKind, LineSegment, Point2, EPSILON};
pub use crate::field::{field_at, WarpField};
pub use crate::sequence::{
    frame_parameter, generate, generate_with, render_frame, warp_side, Frame, FrameSequence,
    GenerateOptions,
};
pub use crate::session::MorphSession;
