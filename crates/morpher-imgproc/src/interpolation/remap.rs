use crate::parallel::{self, ExecutionStrategy, ParallelError};

use super::grid::CoordinateMap;
use super::interpolate::interpolate_pixel;
use super::InterpolationMode;
use morpher_image::{Image, ImageDtype, ImageError};

/// Apply a generic geometric transformation to an image.
///
/// Every destination pixel is sampled from the source at the coordinate
/// stored in `map`, clamping to the source border.
///
/// # Arguments
///
/// * `src` - The input image container with shape (height, width, C).
/// * `dst` - The output image container with shape (height, width, C).
/// * `map` - The source coordinates of every destination pixel.
/// * `interpolation` - The interpolation mode to use.
///
/// # Errors
///
/// * The output image must have the same size as the map.
/// * Every coordinate of the map must be finite.
pub fn remap<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    map: &CoordinateMap,
    interpolation: InterpolationMode,
) -> Result<(), ImageError> {
    if dst.size() != map.size() {
        return Err(ImageError::InvalidImageSize(
            map.size().width,
            map.size().height,
            dst.width(),
            dst.height(),
        ));
    }

    // parallelize the remap operation by rows
    parallel::par_iter_rows_resample(dst, map, |x, y, dst_pixel| {
        let pixel = interpolate_pixel(src, x, y, interpolation)?;
        dst_pixel
            .iter_mut()
            .zip(pixel.iter())
            .for_each(|(out, &val)| *out = T::from_f32(val));
        Ok(())
    })
}

/// Same as [`remap`], scheduling the rows of `dst` with `strategy`.
///
/// The error type only needs to absorb image and thread pool errors, so
/// callers can collect both into their own error.
///
/// # Errors
///
/// * The output image must have the same size as the map.
/// * Every coordinate of the map must be finite.
/// * The strategy must describe a valid thread pool.
pub fn remap_with<T, E, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    map: &CoordinateMap,
    interpolation: InterpolationMode,
    strategy: ExecutionStrategy,
) -> Result<(), E>
where
    T: ImageDtype,
    E: From<ImageError> + From<ParallelError> + Send,
{
    if dst.size() != map.size() {
        return Err(ImageError::InvalidImageSize(
            map.size().width,
            map.size().height,
            dst.width(),
            dst.height(),
        )
        .into());
    }

    let cols = dst.cols();
    if cols == 0 {
        return Ok(());
    }

    parallel::for_each_row(
        strategy,
        dst.as_slice_mut(),
        cols * C,
        |y, row| -> Result<(), E> {
            let span = y * cols..(y + 1) * cols;
            let coords = map.map_x()[span.clone()]
                .iter()
                .zip(map.map_y()[span].iter());

            for (dst_pixel, (&x, &v)) in row.chunks_exact_mut(C).zip(coords) {
                let pixel = interpolate_pixel(src, x, v, interpolation)?;
                dst_pixel
                    .iter_mut()
                    .zip(pixel.iter())
                    .for_each(|(out, &val)| *out = T::from_f32(val));
            }
            Ok(())
        },
    )
}
