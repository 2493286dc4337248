use morpher_image::{Image, ImageDtype};

/// Kernel for nearest neighbor interpolation with border clamping.
///
/// # Arguments
///
/// * `image` - The input image container, with a non-zero size.
/// * `u` - The x coordinate of the pixel to interpolate, finite.
/// * `v` - The y coordinate of the pixel to interpolate, finite.
///
/// # Returns
///
/// The pixel values of the closest pixel.
pub(crate) fn nearest_neighbor_interpolation<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let (rows, cols) = (image.rows(), image.cols());

    let iu = u.round().clamp(0.0, (cols - 1) as f32) as usize;
    let iv = v.round().clamp(0.0, (rows - 1) as f32) as usize;

    let base = (iv * cols + iu) * C;
    let src = &image.as_slice()[base..base + C];

    let mut pixel = [0.0; C];
    for (out, &val) in pixel.iter_mut().zip(src.iter()) {
        *out = val.into();
    }

    pixel
}
