use serde::{Deserialize, Serialize};

use morpher_image::ImageSize;

use crate::error::{MorphError, ValidationError};
use crate::feature::{Feature, LineSegment, Point2};

/// Which of the two source images a feature or warp refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Image A, shown at t = 0.
    Source,
    /// Image B, shown at t = 1.
    Destination,
}

/// An unvalidated pair of matching features, as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeaturePair {
    /// Feature on image A.
    pub source: Feature,
    /// Matching feature on image B.
    pub destination: Feature,
}

/// A validated correspondence between a feature on image A and one on image B.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correspondence {
    /// Two matching points.
    Point(Point2, Point2),
    /// Two matching line segments.
    Line(LineSegment, LineSegment),
}

impl Correspondence {
    /// The feature on the given side.
    pub fn feature(&self, side: Side) -> Feature {
        match (self, side) {
            (Correspondence::Point(a, _), Side::Source) => Feature::Point(*a),
            (Correspondence::Point(_, b), Side::Destination) => Feature::Point(*b),
            (Correspondence::Line(a, _), Side::Source) => Feature::Line(*a),
            (Correspondence::Line(_, b), Side::Destination) => Feature::Line(*b),
        }
    }

    /// The intermediate feature at `t`, from image A's geometry (t = 0) to
    /// image B's geometry (t = 1).
    pub fn interpolate(&self, t: f32) -> Feature {
        match self {
            Correspondence::Point(a, b) => Feature::Point(a.lerp(b, t)),
            Correspondence::Line(a, b) => Feature::Line(a.lerp(b, t)),
        }
    }

    fn from_pair(index: usize, pair: &FeaturePair) -> Result<Self, ValidationError> {
        if !pair.source.is_finite() || !pair.destination.is_finite() {
            return Err(ValidationError::NonFinite(index));
        }

        match (pair.source, pair.destination) {
            (Feature::Point(a), Feature::Point(b)) => Ok(Correspondence::Point(a, b)),
            (Feature::Line(a), Feature::Line(b)) => {
                if a.is_degenerate() || b.is_degenerate() {
                    return Err(ValidationError::DegenerateSegment(index));
                }
                Ok(Correspondence::Line(a, b))
            }
            _ => Err(ValidationError::KindMismatch(index)),
        }
    }

    fn clamped(&self, index: usize, max_x: f32, max_y: f32) -> Result<Self, ValidationError> {
        let clamp_line = |l: &LineSegment| {
            LineSegment::new(l.start.clamp(max_x, max_y), l.end.clamp(max_x, max_y))
        };

        match self {
            Correspondence::Point(a, b) => Ok(Correspondence::Point(
                a.clamp(max_x, max_y),
                b.clamp(max_x, max_y),
            )),
            Correspondence::Line(a, b) => {
                let (a, b) = (clamp_line(a), clamp_line(b));
                if a.is_degenerate() || b.is_degenerate() {
                    return Err(ValidationError::DegenerateSegment(index));
                }
                Ok(Correspondence::Line(a, b))
            }
        }
    }
}

/// The ordered, validated pairing of features between images A and B.
///
/// A set is never empty, pairs features of the same kind at every index,
/// holds only finite coordinates and has no degenerate segments.
///
/// # Example
///
/// ```
/// use morpher_morph::{CorrespondenceSet, Feature};
///
/// let set = CorrespondenceSet::new(
///     vec![Feature::point(0.0, 0.0), Feature::line(0.0, 0.0, 4.0, 0.0)],
///     vec![Feature::point(1.0, 1.0), Feature::line(0.0, 2.0, 4.0, 2.0)],
/// ).unwrap();
///
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CorrespondenceSet {
    pairs: Vec<Correspondence>,
}

impl CorrespondenceSet {
    /// Build a correspondence set from the features of image A and image B.
    ///
    /// # Errors
    ///
    /// * [`ValidationError::CountMismatch`] if the sequences differ in length.
    /// * [`MorphError::EmptyCorrespondence`] if both sequences are empty.
    /// * [`ValidationError::KindMismatch`], [`ValidationError::NonFinite`] or
    ///   [`ValidationError::DegenerateSegment`] for the first offending index.
    pub fn new(source: Vec<Feature>, destination: Vec<Feature>) -> Result<Self, MorphError> {
        if source.len() != destination.len() {
            return Err(ValidationError::CountMismatch(source.len(), destination.len()).into());
        }

        let pairs = source
            .into_iter()
            .zip(destination)
            .map(|(source, destination)| FeaturePair {
                source,
                destination,
            })
            .collect();

        Self::from_pairs(pairs)
    }

    /// Build a correspondence set from already paired features.
    ///
    /// # Errors
    ///
    /// Same as [`CorrespondenceSet::new`], except that counts always match.
    pub fn from_pairs(pairs: Vec<FeaturePair>) -> Result<Self, MorphError> {
        if pairs.is_empty() {
            return Err(MorphError::EmptyCorrespondence);
        }

        let pairs = pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| Correspondence::from_pair(i, pair))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { pairs })
    }

    /// Return a copy with every coordinate clamped into the pixel grid of `size`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DegenerateSegment`] if clamping collapses a segment,
    /// and [`ValidationError::EmptyImage`] if `size` has no pixels.
    pub fn clamped_to(&self, size: ImageSize) -> Result<Self, ValidationError> {
        if size.area() == 0 {
            return Err(ValidationError::EmptyImage);
        }

        let (max_x, max_y) = ((size.width - 1) as f32, (size.height - 1) as f32);
        let pairs = self
            .pairs
            .iter()
            .enumerate()
            .map(|(i, c)| c.clamped(i, max_x, max_y))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { pairs })
    }

    /// The intermediate feature geometry at `t`.
    pub fn interpolate(&self, t: f32) -> Vec<Feature> {
        self.pairs.iter().map(|c| c.interpolate(t)).collect()
    }

    /// The features of one side, in order.
    pub fn features(&self, side: Side) -> Vec<Feature> {
        self.pairs.iter().map(|c| c.feature(side)).collect()
    }

    /// The same correspondences with the roles of A and B swapped.
    pub fn reversed(&self) -> Self {
        let pairs = self
            .pairs
            .iter()
            .map(|c| match *c {
                Correspondence::Point(a, b) => Correspondence::Point(b, a),
                Correspondence::Line(a, b) => Correspondence::Line(b, a),
            })
            .collect();
        Self { pairs }
    }

    /// The validated correspondences.
    pub fn pairs(&self) -> &[Correspondence] {
        &self.pairs
    }

    /// Iterate over the correspondences.
    pub fn iter(&self) -> std::slice::Iter<'_, Correspondence> {
        self.pairs.iter()
    }

    /// Number of correspondences.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the set holds no correspondences.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<'a> IntoIterator for &'a CorrespondenceSet {
    type Item = &'a Correspondence;
    type IntoIter = std::slice::Iter<'a, Correspondence>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}
