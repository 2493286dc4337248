//! Feature-based inverse warping.
//!
//! For a parameter `t` the intermediate feature geometry is the linear
//! interpolation between the features of image A and image B. A
//! [`WarpField`] maps every pixel of that intermediate space back into one
//! of the two source images:
//!
//! * each line correspondence expresses the pixel in the frame of the
//!   interpolated segment (position `u` along it, signed distance `v`
//!   across it) and rebuilds the same `(u, v)` on the side's segment;
//! * each point correspondence translates the pixel by the offset between
//!   the interpolated point and the side's point;
//! * the candidates are averaged with weights `(len^p / (a + dist))^b`.
//!
//! The field is a pure function of `(t, correspondences, side, config)`.

use morpher_image::ImageSize;
use morpher_imgproc::interpolation::grid::CoordinateMap;
use morpher_imgproc::parallel::{ExecutionStrategy, ParallelError};

use crate::config::MorphConfig;
use crate::correspondence::{Correspondence, CorrespondenceSet, Side};
use crate::feature::{LineSegment, Point2, EPSILON};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Vec2 {
    x: f64,
    y: f64,
}

impl Vec2 {
    fn sub(self, o: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - o.x,
            y: self.y - o.y,
        }
    }

    fn add(self, o: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + o.x,
            y: self.y + o.y,
        }
    }

    fn scale(self, s: f64) -> Vec2 {
        Vec2 {
            x: self.x * s,
            y: self.y * s,
        }
    }

    fn dot(self, o: Vec2) -> f64 {
        self.x * o.x + self.y * o.y
    }

    fn perp(self) -> Vec2 {
        Vec2 {
            x: -self.y,
            y: self.x,
        }
    }

    fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl From<Point2> for Vec2 {
    fn from(p: Point2) -> Self {
        Vec2 {
            x: p.x as f64,
            y: p.y as f64,
        }
    }
}

/// Per-correspondence data precomputed for one field.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Kernel {
    Point {
        // interpolated point
        at: Vec2,
        // side point minus interpolated point
        offset: Vec2,
    },
    Line {
        p: Vec2,
        q: Vec2,
        dir: Vec2,
        len: f64,
        len_sq: f64,
        // p * ln(len)
        ln_strength: f64,
        src_p: Vec2,
        src_dir: Vec2,
        // perp(src_dir) / |src_dir|
        src_normal: Vec2,
    },
}

impl Kernel {
    fn point(at: Point2, target: Point2) -> Self {
        let at = Vec2::from(at);
        Kernel::Point {
            at,
            offset: Vec2::from(target).sub(at),
        }
    }

    fn line(interpolated: LineSegment, target: LineSegment, p_exp: f64) -> Self {
        // opposite directions can collapse the interpolated segment; fall
        // back to moving its midpoint
        if interpolated.length() <= EPSILON {
            return Kernel::point(interpolated.midpoint(), target.midpoint());
        }

        let p = Vec2::from(interpolated.start);
        let q = Vec2::from(interpolated.end);
        let dir = q.sub(p);
        let len = dir.norm();

        let src_p = Vec2::from(target.start);
        let src_dir = Vec2::from(target.end).sub(src_p);
        let src_normal = src_dir.perp().scale(1.0 / src_dir.norm());

        Kernel::Line {
            p,
            q,
            dir,
            len,
            len_sq: len * len,
            ln_strength: p_exp * len.ln(),
            src_p,
            src_dir,
            src_normal,
        }
    }

    /// Candidate source position and log weight for pixel `x`.
    ///
    /// `ln w = b * (ln len^p - ln(a + dist))`, with `len^p = 1` for points.
    fn vote(&self, x: Vec2, a: f64, b: f64) -> (Vec2, f64) {
        match *self {
            Kernel::Point { at, offset } => {
                let dist = x.sub(at).norm();
                (x.add(offset), -b * (a + dist).ln())
            }
            Kernel::Line {
                p,
                q,
                dir,
                len,
                len_sq,
                ln_strength,
                src_p,
                src_dir,
                src_normal,
            } => {
                let px = x.sub(p);
                let u = px.dot(dir) / len_sq;
                let v = px.dot(dir.perp()) / len;

                let candidate = src_p.add(src_dir.scale(u)).add(src_normal.scale(v));

                let dist = if u < 0.0 {
                    px.norm()
                } else if u > 1.0 {
                    x.sub(q).norm()
                } else {
                    v.abs()
                };

                (candidate, b * (ln_strength - (a + dist).ln()))
            }
        }
    }
}

fn pick<T>(side: Side, source: T, destination: T) -> T {
    match side {
        Side::Source => source,
        Side::Destination => destination,
    }
}

/// The mapping from intermediate-space pixels back into one source image.
///
/// # Example
///
/// ```
/// use morpher_morph::{field_at, CorrespondenceSet, Feature, MorphConfig, Side};
///
/// let set = CorrespondenceSet::new(
///     vec![Feature::point(0.0, 0.0)],
///     vec![Feature::point(4.0, 0.0)],
/// ).unwrap();
///
/// // halfway, the intermediate point sits at (2, 0); image A's point is 2px left of it
/// let field = field_at(0.5, &set, Side::Source, &MorphConfig::default());
/// assert_eq!(field.map(2.0, 0.0), (0.0, 0.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WarpField {
    side: Side,
    t: f32,
    a: f64,
    b: f64,
    kernels: Vec<Kernel>,
}

impl WarpField {
    /// Build the field mapping the intermediate geometry at `t` into `side`.
    ///
    /// `t` is clamped to [0, 1].
    pub fn new(correspondences: &CorrespondenceSet, side: Side, t: f32, config: &MorphConfig) -> Self {
        let t = t.clamp(0.0, 1.0);
        let p_exp = config.p as f64;

        let kernels = correspondences
            .iter()
            .map(|c| match *c {
                Correspondence::Point(a, b) => Kernel::point(a.lerp(&b, t), pick(side, a, b)),
                Correspondence::Line(a, b) => {
                    Kernel::line(a.lerp(&b, t), pick(side, a, b), p_exp)
                }
            })
            .collect();

        Self {
            side,
            t,
            a: config.a as f64,
            b: config.b as f64,
            kernels,
        }
    }

    /// The side this field maps into.
    pub fn side(&self) -> Side {
        self.side
    }

    /// The interpolation parameter of this field.
    pub fn t(&self) -> f32 {
        self.t
    }

    /// Map an intermediate-space coordinate to a source coordinate.
    ///
    /// The result is the weighted average of every correspondence's
    /// candidate position.
    pub fn map(&self, x: f32, y: f32) -> (f32, f32) {
        let pos = Vec2 {
            x: x as f64,
            y: y as f64,
        };

        // weights are kept relative to the largest log weight seen so far,
        // so the sum stays in [1, n] whatever the magnitude of `b`
        let (_, sum, total) = self.kernels.iter().fold(
            (f64::NEG_INFINITY, Vec2 { x: 0.0, y: 0.0 }, 0.0f64),
            |(max, sum, total), kernel| {
                let (candidate, ln_weight) = kernel.vote(pos, self.a, self.b);
                if ln_weight > max {
                    let rescale = (max - ln_weight).exp();
                    (ln_weight, sum.scale(rescale).add(candidate), total * rescale + 1.0)
                } else {
                    let weight = (ln_weight - max).exp();
                    (max, sum.add(candidate.scale(weight)), total + weight)
                }
            },
        );

        // only reachable for non-finite input
        if total <= 0.0 || !total.is_finite() {
            return (x, y);
        }

        let out = sum.scale(1.0 / total);
        (out.x as f32, out.y as f32)
    }

    /// Evaluate the field at every pixel of `size`.
    pub fn materialize(&self, size: ImageSize) -> CoordinateMap {
        CoordinateMap::from_fn(size, |x, y| self.map(x as f32, y as f32))
    }

    /// Evaluate the field at every pixel of `size`, scheduling rows with
    /// `strategy`.
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy asks for an invalid thread pool.
    pub fn materialize_with(
        &self,
        size: ImageSize,
        strategy: ExecutionStrategy,
    ) -> Result<CoordinateMap, ParallelError> {
        CoordinateMap::from_fn_with(size, strategy, |x, y| self.map(x as f32, y as f32))
    }
}

/// Compute the warp field at `t` for one side of the correspondence set.
///
/// Equivalent to [`WarpField::new`] with the arguments in the order of the
/// sequencing pipeline.
pub fn field_at(t: f32, correspondences: &CorrespondenceSet, side: Side, config: &MorphConfig) -> WarpField {
    WarpField::new(correspondences, side, t, config)
}
