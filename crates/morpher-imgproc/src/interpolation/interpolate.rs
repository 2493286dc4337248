use super::bilinear::bilinear_interpolation;
use super::nearest::nearest_neighbor_interpolation;
use morpher_image::{Image, ImageDtype, ImageError};

/// Interpolation mode for the resampling operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Bilinear interpolation
    #[default]
    Bilinear,
    /// Nearest neighbor interpolation
    Nearest,
}

/// Kernel for interpolating a pixel value
///
/// Coordinates outside the image are clamped to the nearest edge pixel.
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C).
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `interpolation` - The interpolation mode to use.
///
/// # Returns
///
/// The interpolated channel values.
///
/// # Errors
///
/// Returns [`ImageError::InvalidCoordinate`] if `u` or `v` is NaN or infinite,
/// and [`ImageError::PixelIndexOutOfBounds`] if the image has no pixels.
pub fn interpolate_pixel<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f32,
    v: f32,
    interpolation: InterpolationMode,
) -> Result<[f32; C], ImageError> {
    if !u.is_finite() || !v.is_finite() {
        return Err(ImageError::InvalidCoordinate(u, v));
    }

    if image.size().area() == 0 {
        return Err(ImageError::PixelIndexOutOfBounds(
            0,
            0,
            image.width(),
            image.height(),
        ));
    }

    Ok(match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(image, u, v),
        InterpolationMode::Nearest => nearest_neighbor_interpolation(image, u, v),
    })
}

/// Sample an image at a fractional coordinate using bilinear interpolation.
///
/// # Example
///
/// ```
/// use morpher_image::{Image, ImageSize};
/// use morpher_imgproc::interpolation::sample;
///
/// let image = Image::<u8, 1>::new(
///     ImageSize { width: 2, height: 1 },
///     vec![0, 100],
/// ).unwrap();
///
/// assert_eq!(sample(&image, 0.5, 0.0).unwrap(), [50.0]);
/// assert_eq!(sample(&image, -5.0, -5.0).unwrap(), [0.0]);
/// ```
pub fn sample<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f32,
    v: f32,
) -> Result<[f32; C], ImageError> {
    interpolate_pixel(image, u, v, InterpolationMode::Bilinear)
}
