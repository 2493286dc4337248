use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use morpher_image::{Image, ImageDtype};
use morpher_imgproc::blend::blend_f32;
use morpher_imgproc::interpolation::{interpolate_pixel, remap_with};
use morpher_imgproc::parallel::{self, ExecutionStrategy};

use crate::cancel::CancelToken;
use crate::config::{EdgePolicy, MorphConfig};
use crate::correspondence::Side;
use crate::error::{MorphError, ValidationError};
use crate::field::field_at;
use crate::session::MorphSession;

/// One rendered image of a morph sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<T, const C: usize> {
    index: usize,
    t: f32,
    image: Image<T, C>,
}

impl<T, const C: usize> Frame<T, C> {
    /// Position of the frame in its sequence, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The interpolation parameter the frame was rendered at.
    pub fn t(&self) -> f32 {
        self.t
    }

    /// The rendered pixels.
    pub fn image(&self) -> &Image<T, C> {
        &self.image
    }

    /// Take ownership of the rendered pixels.
    pub fn into_image(self) -> Image<T, C> {
        self.image
    }
}

/// Options applying to one call of [`generate_with`].
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    cancel: Option<CancelToken>,
    timeout: Option<Duration>,
}

impl GenerateOptions {
    /// Stop generation when `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Stop generation once `timeout` has elapsed since the `generate` call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Cancellation and deadline checks shared by all rows of a batch.
#[derive(Debug, Clone, Copy, Default)]
struct Checkpoint<'a> {
    cancel: Option<&'a CancelToken>,
    deadline: Option<Instant>,
}

impl Checkpoint<'_> {
    fn check(&self) -> Result<(), MorphError> {
        if self.cancel.is_some_and(|c| c.is_cancelled()) {
            return Err(MorphError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(MorphError::TimedOut);
        }
        Ok(())
    }
}

/// Sample `image` at a warped coordinate under the configured edge policy.
fn resample<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    x: f32,
    y: f32,
    config: &MorphConfig,
) -> Result<[f32; C], MorphError> {
    match config.edge_policy {
        EdgePolicy::Clamp => Ok(interpolate_pixel(image, x, y, config.interpolation)?),
    }
}

/// The interpolation parameter of frame `index` out of `frame_count`.
///
/// The first frame is at exactly 0 and the last at exactly 1.
pub fn frame_parameter(index: usize, frame_count: usize) -> f32 {
    if frame_count < 2 {
        return 0.0;
    }
    index as f32 / (frame_count - 1) as f32
}

/// Render the morph at an arbitrary parameter `t`.
///
/// Every output pixel is mapped through the warp field of image A and the
/// warp field of image B, both images are sampled there, and the two
/// samples are cross-dissolved with weight `t`.
///
/// # Errors
///
/// Returns [`MorphError::InvalidCoordinate`] if the warp produced a
/// non-finite coordinate.
pub fn render_frame<T: ImageDtype, const C: usize>(
    session: &MorphSession<T, C>,
    t: f32,
) -> Result<Image<T, C>, MorphError> {
    render_checked(session, t, &Checkpoint::default())
}

fn render_checked<T: ImageDtype, const C: usize>(
    session: &MorphSession<T, C>,
    t: f32,
    checkpoint: &Checkpoint<'_>,
) -> Result<Image<T, C>, MorphError> {
    let t = t.clamp(0.0, 1.0);
    let size = session.size();
    let config = session.config();

    let field_a = field_at(t, session.correspondences(), Side::Source, config);
    let field_b = field_at(t, session.correspondences(), Side::Destination, config);
    let (src_a, src_b) = (session.source(), session.destination());

    let mut data = vec![T::default(); size.area() * C];

    parallel::for_each_row(
        config.strategy,
        &mut data,
        size.width * C,
        |y, row| -> Result<(), MorphError> {
            checkpoint.check()?;

            let yf = y as f32;
            for (x, pixel) in row.chunks_exact_mut(C).enumerate() {
                let xf = x as f32;
                let (ax, ay) = field_a.map(xf, yf);
                let (bx, by) = field_b.map(xf, yf);

                let pa = resample(src_a, ax, ay, config)?;
                let pb = resample(src_b, bx, by, config)?;

                let blended = blend_f32(&pa, &pb, t);
                pixel
                    .iter_mut()
                    .zip(blended.iter())
                    .for_each(|(out, &val)| *out = T::from_f32(val));
            }

            Ok(())
        },
    )?;

    Ok(Image::new(size, data)?)
}

/// Warp one source image toward the intermediate geometry at `t`, without
/// cross-dissolving.
///
/// The frame at t = 0 of any sequence equals `warp_side(session,
/// Side::Source, 0.0)` and the last frame equals `warp_side(session,
/// Side::Destination, 1.0)`.
///
/// Both the field evaluation and the resampling follow the session's
/// `strategy`.
///
/// # Errors
///
/// Returns [`MorphError::InvalidCoordinate`] if the warp produced a
/// non-finite coordinate.
pub fn warp_side<T: ImageDtype, const C: usize>(
    session: &MorphSession<T, C>,
    side: Side,
    t: f32,
) -> Result<Image<T, C>, MorphError> {
    let config = session.config();
    let field = field_at(t, session.correspondences(), side, config);
    let map = field.materialize_with(session.size(), config.strategy)?;

    let mut dst = Image::from_size_val(session.size(), T::default())?;
    match config.edge_policy {
        EdgePolicy::Clamp => remap_with::<T, MorphError, C>(
            session.image(side),
            &mut dst,
            &map,
            config.interpolation,
            config.strategy,
        )?,
    }

    Ok(dst)
}

/// Lazily render `frame_count` frames of the morph.
///
/// Frame `i` is rendered at `t = i / (frame_count - 1)`. Nothing is
/// computed until the returned iterator is pulled.
///
/// # Errors
///
/// Returns [`ValidationError::FrameCount`] if `frame_count < 2`.
///
/// # Example
///
/// ```
/// use morpher_image::Image;
/// use morpher_morph::{generate, Feature, MorphConfig, MorphSession};
///
/// let red = Image::<u8, 4>::from_size_pixel([2, 2].into(), [255, 0, 0, 255]).unwrap();
/// let blue = Image::<u8, 4>::from_size_pixel([2, 2].into(), [0, 0, 255, 255]).unwrap();
///
/// let session = MorphSession::from_features(
///     red,
///     blue,
///     vec![Feature::point(0.0, 0.0)],
///     vec![Feature::point(0.0, 0.0)],
///     MorphConfig::default(),
/// ).unwrap();
///
/// let frames = generate(&session, 3).unwrap().collect_frames().unwrap();
/// assert_eq!(frames.len(), 3);
/// assert_eq!(frames[1].image().pixel(0, 0).unwrap(), &[128, 0, 128, 255]);
/// ```
pub fn generate<T: ImageDtype, const C: usize>(
    session: &MorphSession<T, C>,
    frame_count: usize,
) -> Result<FrameSequence<'_, T, C>, MorphError> {
    generate_with(session, frame_count, GenerateOptions::default())
}

/// Same as [`generate`], with cancellation and timeout options.
///
/// # Errors
///
/// Returns [`ValidationError::FrameCount`] if `frame_count < 2`.
pub fn generate_with<T: ImageDtype, const C: usize>(
    session: &MorphSession<T, C>,
    frame_count: usize,
    options: GenerateOptions,
) -> Result<FrameSequence<'_, T, C>, MorphError> {
    if frame_count < 2 {
        return Err(ValidationError::FrameCount(frame_count).into());
    }

    let deadline = options
        .timeout
        .and_then(|timeout| Instant::now().checked_add(timeout));

    Ok(FrameSequence {
        session,
        frame_count,
        next_index: 0,
        ready: VecDeque::new(),
        pending_error: None,
        cancel: options.cancel,
        deadline,
        done: false,
    })
}

/// A finite, ordered, lazily rendered sequence of morph frames.
///
/// Frames come out in increasing index order. When the session's
/// `frames_in_flight` is above one, that many frames are rendered in
/// parallel and buffered before being handed out.
///
/// The sequence is forward-only: it cannot be rewound or seeked. Call
/// [`generate`] again to restart; the new sequence reproduces the same
/// frames bit for bit.
///
/// On cancellation, timeout, or an internal sampling defect the sequence
/// yields the error once, after any frame already completed before it, and
/// then ends. A frame interrupted mid-render is discarded.
#[derive(Debug)]
pub struct FrameSequence<'s, T, const C: usize> {
    session: &'s MorphSession<T, C>,
    frame_count: usize,
    next_index: usize,
    ready: VecDeque<Frame<T, C>>,
    pending_error: Option<MorphError>,
    cancel: Option<CancelToken>,
    deadline: Option<Instant>,
    done: bool,
}

impl<T: ImageDtype, const C: usize> FrameSequence<'_, T, C> {
    /// The number of frames the sequence was asked to produce.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Render all remaining frames.
    ///
    /// # Errors
    ///
    /// Returns the first error yielded by the sequence.
    pub fn collect_frames(self) -> Result<Vec<Frame<T, C>>, MorphError> {
        self.collect()
    }

    fn render_batch(&mut self) {
        let checkpoint = Checkpoint {
            cancel: self.cancel.as_ref(),
            deadline: self.deadline,
        };

        if let Err(err) = checkpoint.check() {
            self.pending_error = Some(err);
            return;
        }

        let session = self.session;
        let frame_count = self.frame_count;
        let config = session.config();

        let start = self.next_index;
        let end = (start + config.frames_in_flight).min(frame_count);

        let render = |index: usize| -> Result<Frame<T, C>, MorphError> {
            let t = frame_parameter(index, frame_count);
            let image = render_checked(session, t, &checkpoint)?;
            Ok(Frame { index, t, image })
        };

        let now = Instant::now();
        let results: Vec<_> = if end - start > 1 && config.strategy != ExecutionStrategy::Serial {
            (start..end).into_par_iter().map(render).collect()
        } else {
            (start..end).map(render).collect()
        };
        log::debug!(
            "rendered frames {}..{} of {} in {:?}",
            start,
            end,
            frame_count,
            now.elapsed()
        );

        self.next_index = end;
        for result in results {
            match result {
                Ok(frame) => self.ready.push_back(frame),
                Err(err) => {
                    self.pending_error = Some(err);
                    break;
                }
            }
        }
    }
}

impl<T: ImageDtype, const C: usize> Iterator for FrameSequence<'_, T, C> {
    type Item = Result<Frame<T, C>, MorphError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Some(Ok(frame));
            }

            if let Some(err) = self.pending_error.take() {
                self.done = true;
                if err.is_cancelled() {
                    log::debug!("frame sequence cancelled at frame {}", self.next_index);
                }
                return Some(Err(err));
            }

            if self.done || self.next_index >= self.frame_count {
                return None;
            }

            self.render_batch();
        }
    }
}

impl<T: ImageDtype, const C: usize> std::iter::FusedIterator for FrameSequence<'_, T, C> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Feature, MorphConfig};

    fn solid(pixel: [u8; 4]) -> Result<Image<u8, 4>, MorphError> {
        Ok(Image::from_size_pixel([2, 2].into(), pixel)?)
    }

    fn red_blue_session() -> Result<MorphSession<u8, 4>, MorphError> {
        MorphSession::from_features(
            solid([255, 0, 0, 255])?,
            solid([0, 0, 255, 255])?,
            vec![Feature::point(0.0, 0.0)],
            vec![Feature::point(0.0, 0.0)],
            MorphConfig::default(),
        )
    }

    #[test]
    fn frame_parameters() {
        assert_eq!(frame_parameter(0, 5), 0.0);
        assert_eq!(frame_parameter(2, 5), 0.5);
        assert_eq!(frame_parameter(4, 5), 1.0);
        assert_eq!(frame_parameter(6, 7), 1.0);
    }

    #[test]
    fn red_to_blue() -> Result<(), MorphError> {
        let session = red_blue_session()?;
        let frames = generate(&session, 3)?.collect_frames()?;

        let expected = [[255, 0, 0, 255], [128, 0, 128, 255], [0, 0, 255, 255]];
        assert_eq!(frames.len(), 3);
        for (i, (frame, pixel)) in frames.iter().zip(expected.iter()).enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(frame.image(), &Image::from_size_pixel([2, 2].into(), *pixel)?);
        }
        assert_eq!(frames[1].t(), 0.5);
        Ok(())
    }

    #[test]
    fn frame_count_too_small() -> Result<(), MorphError> {
        let session = red_blue_session()?;
        for n in [0, 1] {
            assert_eq!(
                generate(&session, n).err(),
                Some(MorphError::Validation(ValidationError::FrameCount(n)))
            );
        }
        Ok(())
    }

    #[test]
    fn lazy_until_pulled() -> Result<(), MorphError> {
        let session = red_blue_session()?;
        let token = CancelToken::new();
        let mut frames = generate_with(&session, 4, GenerateOptions::default().with_cancel(token.clone()))?;

        assert!(matches!(frames.next(), Some(Ok(_))));
        token.cancel();
        assert_eq!(frames.next(), Some(Err(MorphError::Cancelled)));
        assert_eq!(frames.next(), None);
        Ok(())
    }

    #[test]
    fn zero_timeout() -> Result<(), MorphError> {
        let session = red_blue_session()?;
        let mut frames = generate_with(
            &session,
            3,
            GenerateOptions::default().with_timeout(Duration::ZERO),
        )?;
        assert_eq!(frames.next(), Some(Err(MorphError::TimedOut)));
        assert_eq!(frames.next(), None);
        Ok(())
    }

    #[test]
    fn samples_outside_repeat_the_edge() -> Result<(), MorphError> {
        let size = [4, 1].into();
        let ramp = Image::<u8, 1>::new(size, vec![10, 20, 30, 40])?;
        let session = MorphSession::from_features(
            ramp.clone(),
            ramp,
            vec![Feature::point(0.0, 0.0)],
            vec![Feature::point(3.0, 0.0)],
            MorphConfig::default(),
        )?;
        assert_eq!(session.config().edge_policy, EdgePolicy::Clamp);

        // every pixel of B's field at t = 0 samples 3 px to the right
        let warped = warp_side(&session, Side::Destination, 0.0)?;
        assert_eq!(warped.as_slice(), &[40, 40, 40, 40]);
        Ok(())
    }

    #[test]
    fn warp_side_follows_strategy() -> Result<(), MorphError> {
        let session = red_blue_session()?;
        let expected = warp_side(&session, Side::Source, 0.5)?;

        let serial = MorphSession::new(
            session.source().clone(),
            session.destination().clone(),
            session.correspondences().clone(),
            MorphConfig::default().with_strategy(ExecutionStrategy::Serial),
        )?;
        assert_eq!(warp_side(&serial, Side::Source, 0.5)?, expected);

        let fixed = MorphSession::new(
            session.source().clone(),
            session.destination().clone(),
            session.correspondences().clone(),
            MorphConfig::default().with_strategy(ExecutionStrategy::Fixed(2)),
        )?;
        assert_eq!(warp_side(&fixed, Side::Source, 0.5)?, expected);
        Ok(())
    }

    #[test]
    fn render_single_frame() -> Result<(), MorphError> {
        let session = red_blue_session()?;
        let image = render_frame(&session, 0.25)?;
        assert_eq!(image.pixel(1, 1)?, &[191, 0, 64, 255]);
        Ok(())
    }
}
