use serde::{Deserialize, Serialize};

/// Minimum length, in pixels, of a line segment feature.
pub const EPSILON: f32 = 1e-3;

/// A point in image pixel coordinates.
///
/// x grows to the right and y grows downward; pixel centers sit on
/// integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point2 {
    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation from `self` (t = 0) to `other` (t = 1).
    ///
    /// Both endpoints are reproduced exactly.
    pub fn lerp(&self, other: &Point2, t: f32) -> Point2 {
        let s = 1.0 - t;
        Point2 {
            x: self.x * s + other.x * t,
            y: self.y * s + other.y * t,
        }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point2) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Whether both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub(crate) fn clamp(&self, max_x: f32, max_y: f32) -> Point2 {
        Point2 {
            x: self.x.clamp(0.0, max_x),
            y: self.y.clamp(0.0, max_y),
        }
    }
}

impl From<(f32, f32)> for Point2 {
    fn from((x, y): (f32, f32)) -> Self {
        Point2 { x, y }
    }
}

/// A directed line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    /// First endpoint.
    pub start: Point2,
    /// Second endpoint.
    pub end: Point2,
}

impl LineSegment {
    /// Create a new segment.
    pub const fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// Length of the segment.
    pub fn length(&self) -> f32 {
        self.start.distance(&self.end)
    }

    /// Midpoint of the segment.
    pub fn midpoint(&self) -> Point2 {
        self.start.lerp(&self.end, 0.5)
    }

    /// Endpoint-wise linear interpolation.
    pub fn lerp(&self, other: &LineSegment, t: f32) -> LineSegment {
        LineSegment {
            start: self.start.lerp(&other.start, t),
            end: self.end.lerp(&other.end, t),
        }
    }

    /// Whether the segment is too short to define a direction.
    pub fn is_degenerate(&self) -> bool {
        self.length() <= EPSILON
    }

    fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }
}

/// The kind of a feature primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// A single landmark point.
    Point,
    /// A landmark line segment.
    Line,
}

/// A user-placed landmark on one image.
///
/// Serialized with a `kind` tag, e.g. `{"kind": "point", "x": 1.0, "y": 2.0}`
/// or `{"kind": "line", "start": {..}, "end": {..}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feature {
    /// A landmark point.
    Point(Point2),
    /// A landmark line segment.
    Line(LineSegment),
}

impl Feature {
    /// Create a point feature.
    pub fn point(x: f32, y: f32) -> Self {
        Feature::Point(Point2::new(x, y))
    }

    /// Create a line feature from `(x0, y0)` to `(x1, y1)`.
    pub fn line(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Feature::Line(LineSegment::new(Point2::new(x0, y0), Point2::new(x1, y1)))
    }

    /// The kind of the feature.
    pub fn kind(&self) -> FeatureKind {
        match self {
            Feature::Point(_) => FeatureKind::Point,
            Feature::Line(_) => FeatureKind::Line,
        }
    }

    /// Whether every coordinate of the feature is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Feature::Point(p) => p.is_finite(),
            Feature::Line(l) => l.is_finite(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_lerp_endpoints() {
        let a = Point2::new(1.0, 2.0);
        let b = Point2::new(5.0, -2.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.5), Point2::new(3.0, 0.0));
    }

    #[test]
    fn segment_geometry() {
        let l = LineSegment::new(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0));
        approx::assert_relative_eq!(l.length(), 5.0);
        assert_eq!(l.midpoint(), Point2::new(1.5, 2.0));
        assert!(!l.is_degenerate());
        assert!(LineSegment::new(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)).is_degenerate());
    }

    #[test]
    fn feature_kind_and_finiteness() {
        assert_eq!(Feature::point(0.0, 0.0).kind(), FeatureKind::Point);
        assert_eq!(Feature::line(0.0, 0.0, 1.0, 1.0).kind(), FeatureKind::Line);
        assert!(!Feature::point(f32::NAN, 0.0).is_finite());
        assert!(!Feature::line(0.0, 0.0, f32::INFINITY, 1.0).is_finite());
    }

    #[test]
    fn feature_json_format() -> Result<(), serde_json::Error> {
        let features: Vec<Feature> = serde_json::from_str(
            r#"[
                {"kind": "point", "x": 1.0, "y": 2.0},
                {"kind": "line", "start": {"x": 0.0, "y": 0.0}, "end": {"x": 4.0, "y": 0.0}}
            ]"#,
        )?;
        assert_eq!(
            features,
            vec![Feature::point(1.0, 2.0), Feature::line(0.0, 0.0, 4.0, 0.0)]
        );
        Ok(())
    }
}
