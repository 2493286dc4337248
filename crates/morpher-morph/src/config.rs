use serde::{Deserialize, Serialize};

use morpher_imgproc::interpolation::InterpolationMode;
use morpher_imgproc::parallel::ExecutionStrategy;

use crate::error::ValidationError;

/// How samples outside the source image are resolved.
///
/// Only clamping to the nearest edge pixel is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Repeat the nearest edge pixel.
    #[default]
    Clamp,
}

/// Parameters of the morphing engine.
///
/// The weight of correspondence `i` for a pixel at distance `d` from its
/// interpolated feature is `(len^p / (a + d))^b`, where `len` is the
/// length of the interpolated segment (1 for points).
///
/// # Example
///
/// ```
/// use morpher_morph::MorphConfig;
///
/// let config = MorphConfig::default().with_b(1.5).with_frames_in_flight(4);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.a, 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphConfig {
    /// Additive distance constant; keeps weights finite on a feature.
    pub a: f32,
    /// Distance falloff exponent.
    pub b: f32,
    /// Segment length exponent.
    pub p: f32,
    /// Edge handling for out-of-image samples.
    pub edge_policy: EdgePolicy,
    /// Sampling kernel used by the resampler.
    pub interpolation: InterpolationMode,
    /// How the rows of one frame are scheduled.
    pub strategy: ExecutionStrategy,
    /// Number of frames rendered concurrently ahead of the consumer.
    pub frames_in_flight: usize,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 2.0,
            p: 0.5,
            edge_policy: EdgePolicy::Clamp,
            interpolation: InterpolationMode::Bilinear,
            strategy: ExecutionStrategy::ParallelRows,
            frames_in_flight: 1,
        }
    }
}

impl MorphConfig {
    /// Set the additive distance constant.
    pub fn with_a(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    /// Set the distance falloff exponent.
    pub fn with_b(mut self, b: f32) -> Self {
        self.b = b;
        self
    }

    /// Set the segment length exponent.
    pub fn with_p(mut self, p: f32) -> Self {
        self.p = p;
        self
    }

    /// Set the sampling kernel.
    pub fn with_interpolation(mut self, interpolation: InterpolationMode) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set the row scheduling strategy.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set how many frames are rendered concurrently.
    pub fn with_frames_in_flight(mut self, frames_in_flight: usize) -> Self {
        self.frames_in_flight = frames_in_flight;
        self
    }

    /// Check that every parameter is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidConfig`] if `a` is not strictly positive,
    /// `b` or `p` is negative, any of them is not finite, `frames_in_flight`
    /// is zero or the strategy asks for zero threads.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.a.is_finite() || self.a <= 0.0 {
            return Err(ValidationError::InvalidConfig(format!(
                "a must be finite and > 0, got {}",
                self.a
            )));
        }
        if !self.b.is_finite() || self.b < 0.0 {
            return Err(ValidationError::InvalidConfig(format!(
                "b must be finite and >= 0, got {}",
                self.b
            )));
        }
        if !self.p.is_finite() || self.p < 0.0 {
            return Err(ValidationError::InvalidConfig(format!(
                "p must be finite and >= 0, got {}",
                self.p
            )));
        }
        if self.frames_in_flight == 0 {
            return Err(ValidationError::InvalidConfig(
                "frames_in_flight must be > 0".to_string(),
            ));
        }
        if self.strategy == ExecutionStrategy::Fixed(0) {
            return Err(ValidationError::InvalidConfig(
                "fixed thread count must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
