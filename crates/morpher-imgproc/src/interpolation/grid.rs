use rayon::prelude::*;

use morpher_image::{ImageError, ImageSize};

use crate::parallel::{self, ExecutionStrategy, ParallelError};

/// A dense mapping from destination pixels to source coordinates.
///
/// For every destination pixel `(x, y)` the map stores the fractional
/// source coordinate `(map_x[y * width + x], map_y[y * width + x])` to
/// sample from.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateMap {
    size: ImageSize,
    map_x: Vec<f32>,
    map_y: Vec<f32>,
}

impl CoordinateMap {
    /// Create a coordinate map from precomputed x and y grids.
    ///
    /// # Errors
    ///
    /// Returns an error if either grid length differs from the size area.
    pub fn new(size: ImageSize, map_x: Vec<f32>, map_y: Vec<f32>) -> Result<Self, ImageError> {
        if map_x.len() != size.area() {
            return Err(ImageError::InvalidChannelShape(map_x.len(), size.area()));
        }
        if map_y.len() != size.area() {
            return Err(ImageError::InvalidChannelShape(map_y.len(), size.area()));
        }
        Ok(Self { size, map_x, map_y })
    }

    /// Create the identity map where every pixel samples itself.
    ///
    /// # Example
    ///
    /// ```
    /// use morpher_imgproc::interpolation::grid::CoordinateMap;
    ///
    /// let map = CoordinateMap::identity([3, 2].into());
    /// assert_eq!(map.get(2, 1), Some((2.0, 1.0)));
    /// ```
    pub fn identity(size: ImageSize) -> Self {
        Self::from_fn(size, |x, y| (x as f32, y as f32))
    }

    /// Create a coordinate map by evaluating `f` at every destination pixel.
    ///
    /// Rows are evaluated in parallel.
    pub fn from_fn<F>(size: ImageSize, f: F) -> Self
    where
        F: Fn(usize, usize) -> (f32, f32) + Send + Sync,
    {
        let mut map_x = vec![0.0; size.area()];
        let mut map_y = vec![0.0; size.area()];

        let cols = size.width.max(1);
        map_x
            .par_chunks_exact_mut(cols)
            .zip(map_y.par_chunks_exact_mut(cols))
            .enumerate()
            .for_each(|(y, (row_x, row_y))| {
                row_x
                    .iter_mut()
                    .zip(row_y.iter_mut())
                    .enumerate()
                    .for_each(|(x, (mx, my))| {
                        let (u, v) = f(x, y);
                        *mx = u;
                        *my = v;
                    });
            });

        Self { size, map_x, map_y }
    }

    /// Create a coordinate map by evaluating `f` at every destination pixel,
    /// scheduling rows with `strategy`.
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy asks for an invalid thread pool.
    pub fn from_fn_with<F>(
        size: ImageSize,
        strategy: ExecutionStrategy,
        f: F,
    ) -> Result<Self, ParallelError>
    where
        F: Fn(usize, usize) -> (f32, f32) + Send + Sync,
    {
        let mut coords = vec![(0.0f32, 0.0f32); size.area()];

        if size.width > 0 {
            parallel::for_each_row(strategy, &mut coords, size.width, |y, row| {
                row.iter_mut()
                    .enumerate()
                    .for_each(|(x, coord)| *coord = f(x, y));
                Ok::<(), ParallelError>(())
            })?;
        }

        let (map_x, map_y) = coords.into_iter().unzip();
        Ok(Self { size, map_x, map_y })
    }

    /// The destination size covered by the map.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The source x coordinates, row-major.
    pub fn map_x(&self) -> &[f32] {
        &self.map_x
    }

    /// The source y coordinates, row-major.
    pub fn map_y(&self) -> &[f32] {
        &self.map_y
    }

    /// The source coordinate for destination pixel `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<(f32, f32)> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let idx = y * self.size.width + x;
        Some((self.map_x[idx], self.map_y[idx]))
    }
}

#[cfg(test)]
mod tests {
    use super::CoordinateMap;
    use crate::parallel::{ExecutionStrategy, ParallelError};
    use morpher_image::{ImageError, ImageSize};

    #[test]
    fn identity_map() {
        let map = CoordinateMap::identity(ImageSize {
            width: 2,
            height: 3,
        });
        assert_eq!(map.map_x(), &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(map.map_y(), &[0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
        assert_eq!(map.get(2, 0), None);
    }

    #[test]
    fn map_from_fn() {
        let map = CoordinateMap::from_fn([2, 2].into(), |x, y| (x as f32 + 0.5, y as f32 * 2.0));
        assert_eq!(map.get(1, 1), Some((1.5, 2.0)));
    }

    #[test]
    fn map_from_fn_with_strategies() -> Result<(), ParallelError> {
        let size = [5, 3].into();
        let f = |x: usize, y: usize| (x as f32 * 0.5, y as f32 + 1.0);
        let expected = CoordinateMap::from_fn(size, f);
        for strategy in [
            ExecutionStrategy::Serial,
            ExecutionStrategy::ParallelRows,
            ExecutionStrategy::Fixed(2),
        ] {
            assert_eq!(CoordinateMap::from_fn_with(size, strategy, f)?, expected);
        }
        assert_eq!(
            CoordinateMap::from_fn_with(size, ExecutionStrategy::Fixed(0), f),
            Err(ParallelError::InvalidThreadCount(0))
        );
        Ok(())
    }

    #[test]
    fn map_new_checks_length() {
        let res = CoordinateMap::new([2, 2].into(), vec![0.0; 4], vec![0.0; 3]);
        assert_eq!(res, Err(ImageError::InvalidChannelShape(3, 4)));
    }
}
