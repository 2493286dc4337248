use morpher_image::{Image, ImageDtype, ImageError};

use crate::parallel;

/// Linearly blend two resampled pixels with weight `t`.
///
/// dst(c) = a(c) * (1 - t) + b(c) * t
///
/// `t` is clamped to [0, 1]. The weights are exactly 1 and 0 at the
/// endpoints, so `t = 0` returns `a` and `t = 1` returns `b` bit for bit.
pub fn blend_f32<const C: usize>(a: &[f32; C], b: &[f32; C], t: f32) -> [f32; C] {
    let t = t.clamp(0.0, 1.0);
    let s = 1.0 - t;

    let mut pixel = [0.0; C];
    for ((out, &va), &vb) in pixel.iter_mut().zip(a.iter()).zip(b.iter()) {
        *out = va * s + vb * t;
    }

    pixel
}

/// Cross-dissolve two pixels with weight `t`.
///
/// Each channel is computed as `round((1 - t) * a + t * b)` and clamped to
/// the valid range of the pixel type.
///
/// # Example
///
/// ```
/// use morpher_imgproc::blend::blend;
///
/// let red = [255u8, 0, 0, 255];
/// let blue = [0u8, 0, 255, 255];
///
/// assert_eq!(blend(&red, &blue, 0.0), red);
/// assert_eq!(blend(&red, &blue, 0.5), [128, 0, 128, 255]);
/// assert_eq!(blend(&red, &blue, 1.0), blue);
/// ```
pub fn blend<T: ImageDtype, const C: usize>(a: &[T; C], b: &[T; C], t: f32) -> [T; C] {
    let af = a.map(|x| -> f32 { x.into() });
    let bf = b.map(|x| -> f32 { x.into() });
    blend_f32(&af, &bf, t).map(T::from_f32)
}

/// Cross-dissolve two images into `dst` with weight `t`.
///
/// # Arguments
///
/// * `src1` - The image shown at `t = 0`.
/// * `src2` - The image shown at `t = 1`.
/// * `t` - The blend weight, clamped to [0, 1].
/// * `dst` - The output image.
///
/// # Errors
///
/// Returns an error if the sizes of `src1`, `src2` and `dst` do not match.
pub fn cross_dissolve<T: ImageDtype, const C: usize>(
    src1: &Image<T, C>,
    src2: &Image<T, C>,
    t: f32,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError> {
    if src1.size() != src2.size() {
        return Err(ImageError::InvalidImageSize(
            src1.cols(),
            src1.rows(),
            src2.cols(),
            src2.rows(),
        ));
    }

    if src1.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src1.width(),
            src1.height(),
            dst.width(),
            dst.height(),
        ));
    }

    let t = t.clamp(0.0, 1.0);
    let s = 1.0 - t;

    parallel::par_iter_rows_val_two(src1, src2, dst, |&a, &b, dst_pixel| {
        let (a, b): (f32, f32) = (a.into(), b.into());
        *dst_pixel = T::from_f32(a * s + b * t);
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use morpher_image::{Image, ImageError, ImageSize};

    use super::{blend, blend_f32, cross_dissolve};

    #[test]
    fn blend_endpoints_are_exact() {
        let a = [13u8, 200, 0, 255];
        let b = [250u8, 1, 77, 0];
        assert_eq!(blend(&a, &b, 0.0), a);
        assert_eq!(blend(&a, &b, 1.0), b);

        let af = [0.3f32, 17.123, 254.999];
        let bf = [9.7f32, 0.001, 3.5];
        assert_eq!(blend_f32(&af, &bf, 0.0), af);
        assert_eq!(blend_f32(&af, &bf, 1.0), bf);
    }

    #[test]
    fn blend_rounds_and_clamps_weight() {
        let a = [0u8, 10];
        let b = [3u8, 20];
        assert_eq!(blend(&a, &b, 0.5), [2, 15]);
        assert_eq!(blend(&a, &b, -1.0), a);
        assert_eq!(blend(&a, &b, 4.0), b);
    }

    #[test]
    fn blend_symmetric_at_half() {
        let a = [40u8, 90, 255];
        let b = [100u8, 0, 3];
        assert_eq!(blend(&a, &b, 0.5), blend(&b, &a, 0.5));
    }

    #[test]
    fn test_cross_dissolve() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 2,
            height: 1,
        };
        let src1 = Image::<u8, 2>::new(size, vec![0, 100, 200, 255])?;
        let src2 = Image::<u8, 2>::new(size, vec![100, 0, 0, 255])?;
        let mut dst = Image::<u8, 2>::from_size_val(size, 0)?;

        cross_dissolve(&src1, &src2, 0.25, &mut dst)?;
        assert_eq!(dst.as_slice(), &[25, 75, 150, 255]);

        cross_dissolve(&src1, &src2, 0.0, &mut dst)?;
        assert_eq!(dst, src1);

        cross_dissolve(&src1, &src2, 1.0, &mut dst)?;
        assert_eq!(dst, src2);

        Ok(())
    }

    #[test]
    fn test_cross_dissolve_size_mismatch() -> Result<(), ImageError> {
        let src1 = Image::<f32, 1>::from_size_val([2, 2].into(), 0.0)?;
        let src2 = Image::<f32, 1>::from_size_val([2, 3].into(), 0.0)?;
        let mut dst = Image::<f32, 1>::from_size_val([2, 2].into(), 0.0)?;
        assert_eq!(
            cross_dissolve(&src1, &src2, 0.5, &mut dst),
            Err(ImageError::InvalidImageSize(2, 2, 2, 3))
        );
        Ok(())
    }
}
