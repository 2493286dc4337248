use morpher_image::{Image, ImageDtype};

/// Kernel for bilinear interpolation with border clamping.
///
/// # Arguments
///
/// * `image` - The input image container, with a non-zero size.
/// * `u` - The x coordinate of the pixel to interpolate, finite.
/// * `v` - The y coordinate of the pixel to interpolate, finite.
///
/// # Returns
///
/// The interpolated pixel values.
pub(crate) fn bilinear_interpolation<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let (rows, cols) = (image.rows(), image.cols());

    let u = u.clamp(0.0, (cols - 1) as f32);
    let v = v.clamp(0.0, (rows - 1) as f32);

    let iu0 = u.floor() as usize;
    let iv0 = v.floor() as usize;

    let frac_u = u - iu0 as f32;
    let frac_v = v - iv0 as f32;

    let frac_uu = 1.0 - frac_u;
    let frac_vv = 1.0 - frac_v;

    let w00 = frac_uu * frac_vv;
    let w01 = frac_u * frac_vv;
    let w10 = frac_uu * frac_v;
    let w11 = frac_u * frac_v;

    let iu1 = (iu0 + 1).min(cols - 1);
    let iv1 = (iv0 + 1).min(rows - 1);

    let base00 = (iv0 * cols + iu0) * C;
    let base01 = (iv0 * cols + iu1) * C;
    let base10 = (iv1 * cols + iu0) * C;
    let base11 = (iv1 * cols + iu1) * C;

    let data = image.as_slice();

    let p00 = &data[base00..base00 + C];
    let p01 = &data[base01..base01 + C];
    let p10 = &data[base10..base10 + C];
    let p11 = &data[base11..base11 + C];

    let value = |x: T| -> f32 { x.into() };

    let mut pixel = [0.0; C];
    for (k, out) in pixel.iter_mut().enumerate() {
        *out = value(p00[k]) * w00
            + value(p01[k]) * w01
            + value(p10[k]) * w10
            + value(p11[k]) * w11;
    }

    pixel
}
