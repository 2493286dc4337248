use morpher_image::{ImageError, ImageSize};
use morpher_imgproc::parallel::ParallelError;

/// Malformed morph input, reported before any frame is rendered.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    /// The two feature sequences have different lengths.
    #[error("feature count mismatch: {0} source features vs {1} destination features")]
    CountMismatch(usize, usize),

    /// The features at the given index are not of the same kind.
    #[error("feature kind mismatch at index {0}")]
    KindMismatch(usize),

    /// A feature at the given index has a NaN or infinite coordinate.
    #[error("non-finite feature coordinate at index {0}")]
    NonFinite(usize),

    /// A line segment at the given index is too short to define a direction.
    #[error("degenerate line segment at index {0}")]
    DegenerateSegment(usize),

    /// Fewer than two frames were requested.
    #[error("frame count must be at least 2, got {0}")]
    FrameCount(usize),

    /// The source images do not share a size.
    #[error("source images differ in size: {0} vs {1}")]
    ImageSizeMismatch(ImageSize, ImageSize),

    /// The source images have no pixels.
    #[error("source images must not be empty")]
    EmptyImage,

    /// A configuration value is out of range.
    #[error("invalid morph configuration: {0}")]
    InvalidConfig(String),
}

/// An error type for the morph module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MorphError {
    /// The morph input failed validation.
    #[error("invalid morph input: {0}")]
    Validation(#[from] ValidationError),

    /// No feature primitives were supplied.
    #[error("the correspondence set is empty")]
    EmptyCorrespondence,

    /// A non-finite coordinate reached the resampler.
    #[error("non-finite sampling coordinate ({x}, {y})")]
    InvalidCoordinate {
        /// The x coordinate.
        x: f32,
        /// The y coordinate.
        y: f32,
    },

    /// Generation stopped because the cancel token was triggered.
    #[error("morph generation was cancelled")]
    Cancelled,

    /// Generation exceeded the timeout given to `generate`.
    #[error("morph generation timed out")]
    TimedOut,

    /// Error from the image buffers.
    #[error(transparent)]
    Image(ImageError),

    /// Error from the parallel executor.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}

impl MorphError {
    /// Whether the error is a cooperative cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MorphError::Cancelled)
    }

    /// Whether the error comes from validating the morph input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MorphError::Validation(_) | MorphError::EmptyCorrespondence
        )
    }
}

impl From<ImageError> for MorphError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::InvalidCoordinate(x, y) => MorphError::InvalidCoordinate { x, y },
            other => MorphError::Image(other),
        }
    }
}
